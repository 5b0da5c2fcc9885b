//! Raffle lifecycle endpoints.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use rifas_core::entities::RaffleVisibility;
use rifas_core::entities::raffle::ListRaffles;
use rifas_core::random::RngSource;
use rifas_core::services::capacity::{CapacityManager, NewRaffle, RaffleChanges};
use rifas_sdk::objects::{
    CreateRaffleRequest, CreateRaffleResponse, DeleteRaffleResponse, EditRaffleRequest,
    RaffleResponse,
};
use rust_decimal::Decimal;

use crate::api::ApiError;
use crate::api::extractors::{AdminAuth, JsonBody, PathParam};
use crate::state::AppState;

/// `POST /administrador/crearRifas`
pub async fn create_raffle(
    state: State<AppState>,
    auth: AdminAuth,
    JsonBody(payload): JsonBody<CreateRaffleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store();
    let tickets = *state.config.tickets.read().await;
    let mut source = RngSource::from_os_rng();

    let created = CapacityManager::new(&store, tickets)
        .create(
            NewRaffle {
                title: payload.title,
                description: payload.description,
                ticket_count: payload.ticket_count,
                price: payload.price.unwrap_or(Decimal::ZERO),
                prize_count: payload.prize_count.unwrap_or(1),
                visibility: payload
                    .visibility
                    .map(RaffleVisibility::from)
                    .unwrap_or_default(),
                image_url: payload.image_url,
            },
            &mut source,
        )
        .await?;

    tracing::info!(
        admin_id = auth.id,
        rol = %auth.rol,
        raffle_id = created.raffle.id,
        "Raffle created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CreateRaffleResponse {
            raffle: created.raffle.into(),
            codes: created.codes,
        }),
    ))
}

/// `GET /administrador/listarRifas`
pub async fn list_raffles(
    state: State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<RaffleResponse>>, ApiError> {
    let raffles = state
        .store()
        .process(ListRaffles { visibility: None })
        .await?;
    Ok(Json(raffles.into_iter().map(Into::into).collect()))
}

/// `PUT /administrador/editarRifa/{id}`
pub async fn edit_raffle(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
    JsonBody(payload): JsonBody<EditRaffleRequest>,
) -> Result<Json<RaffleResponse>, ApiError> {
    let store = state.store();
    let tickets = *state.config.tickets.read().await;
    let mut source = RngSource::from_os_rng();

    let raffle = CapacityManager::new(&store, tickets)
        .edit(
            raffle_id,
            RaffleChanges {
                title: payload.title,
                description: payload.description,
                ticket_count: payload.ticket_count,
                price: payload.price,
                prize_count: payload.prize_count,
                visibility: payload.visibility.map(Into::into),
                image_url: payload.image_url,
            },
            &mut source,
        )
        .await?;

    tracing::info!(admin_id = auth.id, rol = %auth.rol, raffle_id, "Raffle edited");
    Ok(Json(raffle.into()))
}

/// `DELETE /administrador/eliminarRifa/{id}`
pub async fn delete_raffle(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<DeleteRaffleResponse>, ApiError> {
    let store = state.store();
    let tickets = *state.config.tickets.read().await;
    CapacityManager::new(&store, tickets)
        .delete(raffle_id)
        .await?;

    tracing::info!(admin_id = auth.id, rol = %auth.rol, raffle_id, "Raffle deleted");
    Ok(Json(DeleteRaffleResponse {
        message: "Rifa eliminada".to_string(),
        id: raffle_id,
    }))
}
