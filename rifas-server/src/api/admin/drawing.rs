//! Draw endpoints: batch/simple draws, live rounds, winner listing.

use axum::{Json, extract::State};
use kanau::processor::Processor;
use rifas_core::entities::winner::ListWinners;
use rifas_core::random::RngSource;
use rifas_core::services::drawing::DrawingEngine;
use rifas_core::services::load_raffle;
use rifas_sdk::objects::{
    DrawRequest, DrawResponse, LiveDrawRequest, LiveDrawResponse, LiveEventsCleanupResponse,
    WinnerResponse,
};

use crate::api::ApiError;
use crate::api::extractors::{AdminAuth, OptionalJsonBody, PathParam};
use crate::state::AppState;

/// `POST /administrador/rifas/sorteo/{id}`
///
/// The body is optional; `productos` assigns product ids by prize order.
pub async fn draw(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
    OptionalJsonBody(payload): OptionalJsonBody<DrawRequest>,
) -> Result<Json<DrawResponse>, ApiError> {
    let store = state.store();
    let drawing = *state.config.drawing.read().await;
    let mut source = RngSource::from_os_rng();

    let record = DrawingEngine::new(&store, drawing)
        .draw(raffle_id, &payload.products, &mut source)
        .await?;

    tracing::info!(
        admin_id = auth.id,
        rol = %auth.rol,
        raffle_id,
        winners = record.winners.len(),
        "Draw executed"
    );
    Ok(Json(DrawResponse {
        message: "Sorteo realizado".to_string(),
        winners: record.winners.into_iter().map(Into::into).collect(),
        raffle: record.raffle.into(),
    }))
}

/// `POST /administrador/rifas/sorteo-en-vivo/{rifaId}`
pub async fn draw_live_round(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
    OptionalJsonBody(payload): OptionalJsonBody<LiveDrawRequest>,
) -> Result<Json<LiveDrawResponse>, ApiError> {
    let store = state.store();
    let drawing = *state.config.drawing.read().await;
    let mut source = RngSource::from_os_rng();

    let round = DrawingEngine::new(&store, drawing)
        .draw_live_round(raffle_id, payload.product_id, &mut source)
        .await?;

    tracing::info!(
        admin_id = auth.id,
        rol = %auth.rol,
        raffle_id,
        order = round.order,
        "Live round executed"
    );
    Ok(Json(LiveDrawResponse {
        order: round.order,
        winner: round.winner.into(),
        losers: round.losers.into_iter().map(Into::into).collect(),
        remaining_prizes: round.remaining_prizes,
        raffle: round.raffle.into(),
    }))
}

/// `DELETE /administrador/rifas/sorteo-en-vivo/{rifaId}/eventos`
pub async fn clear_live_events(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<LiveEventsCleanupResponse>, ApiError> {
    let store = state.store();
    let drawing = *state.config.drawing.read().await;
    let deleted = DrawingEngine::new(&store, drawing)
        .clear_live_events(raffle_id)
        .await?;

    tracing::info!(admin_id = auth.id, rol = %auth.rol, raffle_id, deleted, "Live events cleared");
    Ok(Json(LiveEventsCleanupResponse { deleted }))
}

/// `GET /administrador/rifas/ganadores/{id}`
pub async fn list_winners(
    state: State<AppState>,
    _auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<Vec<WinnerResponse>>, ApiError> {
    let store = state.store();
    load_raffle(&store, raffle_id).await?;
    let winners = store.process(ListWinners { raffle_id }).await?;
    Ok(Json(winners.into_iter().map(Into::into).collect()))
}
