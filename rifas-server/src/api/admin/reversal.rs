//! Draw reversal endpoints.

use axum::{Json, extract::State};
use compact_str::CompactString;
use rifas_core::entities::winner::RevertRecord;
use rifas_core::services::reversal::ReversalService;
use rifas_sdk::objects::RevertResponse;

use crate::api::ApiError;
use crate::api::extractors::{AdminAuth, PathParam};
use crate::state::AppState;

fn to_response(message: &str, record: RevertRecord) -> RevertResponse {
    RevertResponse {
        message: message.to_string(),
        reverted_codes: record.removed.into_iter().map(|w| w.code).collect(),
        raffle: record.raffle.into(),
    }
}

/// `PUT /administrador/rifas/revertir-sorteo/{id}`
pub async fn revert_raffle(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(raffle_id): PathParam<i64>,
) -> Result<Json<RevertResponse>, ApiError> {
    let store = state.store();
    let record = ReversalService::new(&store).revert_raffle(raffle_id).await?;
    tracing::info!(
        admin_id = auth.id,
        rol = %auth.rol,
        raffle_id,
        reverted = record.removed.len(),
        "Draw reverted"
    );
    Ok(Json(to_response("Sorteo revertido", record)))
}

/// `PUT /administrador/rifas/revertir-ganador/{winnerId}`
pub async fn revert_winner(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam(winner_id): PathParam<i64>,
) -> Result<Json<RevertResponse>, ApiError> {
    let store = state.store();
    let record = ReversalService::new(&store).revert_winner(winner_id).await?;
    tracing::info!(admin_id = auth.id, rol = %auth.rol, winner_id, "Winner reverted");
    Ok(Json(to_response("Ganador revertido", record)))
}

/// `PUT /administrador/rifas/{id}/revertir-premio/{orden}`
pub async fn revert_prize(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam((raffle_id, order)): PathParam<(i64, u32)>,
) -> Result<Json<RevertResponse>, ApiError> {
    let store = state.store();
    let record = ReversalService::new(&store)
        .revert_order(raffle_id, order)
        .await?;
    tracing::info!(admin_id = auth.id, rol = %auth.rol, raffle_id, order, "Prize reverted");
    Ok(Json(to_response("Premio revertido", record)))
}

/// `PUT /administrador/rifas/{id}/revertir-boleto/{numero}`
pub async fn revert_ticket(
    state: State<AppState>,
    auth: AdminAuth,
    PathParam((raffle_id, code)): PathParam<(i64, CompactString)>,
) -> Result<Json<RevertResponse>, ApiError> {
    let store = state.store();
    let record = ReversalService::new(&store)
        .revert_code(raffle_id, &code)
        .await?;
    tracing::info!(
        admin_id = auth.id,
        rol = %auth.rol,
        raffle_id,
        code = %code,
        "Winning ticket reverted"
    );
    Ok(Json(to_response("Boleto revertido", record)))
}
