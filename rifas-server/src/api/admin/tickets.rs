//! Ticket listing and sales.

use axum::{Json, extract::State};
use kanau::processor::Processor;
use rifas_core::entities::ticket::{Buyer, ListTickets};
use rifas_core::services::assignment::AssignmentService;
use rifas_core::services::load_raffle;
use rifas_sdk::objects::{AssignTicketsRequest, AssignTicketsResponse, TicketResponse};

use crate::api::ApiError;
use crate::api::extractors::{AdminAuth, JsonBody, PathParam};
use crate::state::AppState;

/// `GET /administrador/rifas/boletos/{id}`
pub async fn list_tickets(
    state: State<AppState>,
    _auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<Vec<TicketResponse>>, ApiError> {
    let store = state.store();
    load_raffle(&store, raffle_id).await?;
    let tickets = store.process(ListTickets { raffle_id }).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

/// `POST /administrador/boletos/asignar/{rifaId}`
pub async fn assign_tickets(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
    JsonBody(payload): JsonBody<AssignTicketsRequest>,
) -> Result<Json<AssignTicketsResponse>, ApiError> {
    let store = state.store();
    let sold = AssignmentService::new(&store)
        .assign(
            raffle_id,
            Buyer {
                name: payload.name,
                surname: payload.surname,
                phone: payload.phone,
            },
            payload.quantity,
        )
        .await?;

    tracing::info!(
        admin_id = auth.id,
        rol = %auth.rol,
        raffle_id,
        quantity = sold.len(),
        "Tickets assigned"
    );
    Ok(Json(AssignTicketsResponse {
        assigned: u32::try_from(sold.len()).unwrap_or(u32::MAX),
        codes: sold.into_iter().map(|ticket| ticket.code).collect(),
    }))
}
