//! Public read-only API.
//!
//! Only raffles with `publico` visibility are reachable; a hidden raffle
//! answers 404. Buyer phone numbers are never exposed.
//!
//! # Endpoints
//!
//! - `GET /rifas`                     – public raffles, newest first
//! - `GET /rifas/{id}`                – one raffle
//! - `GET /rifas/{id}/boletos`        – ticket codes and states
//! - `GET /rifas/{id}/ganadores`      – winners
//! - `GET /rifas/{id}/sorteo-en-vivo` – live draw replay

use axum::{Json, Router, extract::State, routing::get};
use kanau::processor::Processor;
use rifas_core::entities::RaffleVisibility;
use rifas_core::entities::live_draw_event::ListLiveDrawEvents;
use rifas_core::entities::raffle::{ListRaffles, Raffle};
use rifas_core::entities::ticket::ListTickets;
use rifas_core::entities::winner::ListWinners;
use rifas_core::framework::DatabaseProcessor;
use rifas_core::services::load_raffle;
use rifas_core::{RaffleError, Resource};
use rifas_sdk::objects::{
    LiveDrawEventResponse, PublicTicketResponse, PublicWinnerResponse, RaffleResponse,
};

use crate::api::ApiError;
use crate::api::extractors::PathParam;
use crate::state::AppState;

/// Build the public API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rifas", get(list_raffles))
        .route("/rifas/{id}", get(get_raffle))
        .route("/rifas/{id}/boletos", get(list_tickets))
        .route("/rifas/{id}/ganadores", get(list_winners))
        .route("/rifas/{id}/sorteo-en-vivo", get(live_events))
}

async fn load_public_raffle(
    store: &DatabaseProcessor,
    raffle_id: i64,
) -> Result<Raffle, ApiError> {
    let raffle = load_raffle(store, raffle_id).await?;
    if raffle.visibility != RaffleVisibility::Public {
        return Err(RaffleError::NotFound(Resource::Raffle).into());
    }
    Ok(raffle)
}

async fn list_raffles(state: State<AppState>) -> Result<Json<Vec<RaffleResponse>>, ApiError> {
    let raffles = state
        .store()
        .process(ListRaffles {
            visibility: Some(RaffleVisibility::Public),
        })
        .await?;
    Ok(Json(raffles.into_iter().map(Into::into).collect()))
}

async fn get_raffle(
    state: State<AppState>,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<RaffleResponse>, ApiError> {
    let raffle = load_public_raffle(&state.store(), raffle_id).await?;
    Ok(Json(raffle.into()))
}

async fn list_tickets(
    state: State<AppState>,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<Vec<PublicTicketResponse>>, ApiError> {
    let store = state.store();
    load_public_raffle(&store, raffle_id).await?;
    let tickets = store.process(ListTickets { raffle_id }).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

async fn list_winners(
    state: State<AppState>,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<Vec<PublicWinnerResponse>>, ApiError> {
    let store = state.store();
    load_public_raffle(&store, raffle_id).await?;
    let winners = store.process(ListWinners { raffle_id }).await?;
    Ok(Json(winners.into_iter().map(Into::into).collect()))
}

async fn live_events(
    state: State<AppState>,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<Vec<LiveDrawEventResponse>>, ApiError> {
    let store = state.store();
    load_public_raffle(&store, raffle_id).await?;
    let events = store.process(ListLiveDrawEvents { raffle_id }).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}
