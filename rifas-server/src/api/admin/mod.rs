//! Administrator API handlers.
//!
//! Every endpoint requires `Authorization: Bearer {token}`.
//!
//! # Endpoints
//!
//! - `POST   /crearRifas`                              – create a raffle and its tickets
//! - `GET    /listarRifas`                             – list raffles, newest first
//! - `PUT    /editarRifa/{id}`                         – edit a raffle, resizing its tickets
//! - `DELETE /eliminarRifa/{id}`                       – delete a raffle
//! - `GET    /rifas/boletos/{id}`                      – list tickets with buyer data
//! - `POST   /boletos/asignar/{rifaId}`                – sell free tickets to one buyer
//! - `POST   /rifas/sorteo/{id}`                       – draw every prize
//! - `POST   /rifas/sorteo-en-vivo/{rifaId}`           – draw the next live round
//! - `DELETE /rifas/sorteo-en-vivo/{rifaId}/eventos`   – drop live reveal events
//! - `PUT    /rifas/revertir-sorteo/{id}`              – undo every prize
//! - `PUT    /rifas/revertir-ganador/{winnerId}`       – undo one prize by winner id
//! - `PUT    /rifas/{id}/revertir-premio/{orden}`      – undo one prize by order
//! - `PUT    /rifas/{id}/revertir-boleto/{numero}`     – undo one prize by winning code
//! - `GET    /rifas/ganadores/{id}`                    – list winners

mod drawing;
mod raffles;
mod reversal;
mod tickets;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Build the administrator API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crearRifas", post(raffles::create_raffle))
        .route("/listarRifas", get(raffles::list_raffles))
        .route("/editarRifa/{id}", put(raffles::edit_raffle))
        .route("/eliminarRifa/{id}", delete(raffles::delete_raffle))
        .route("/rifas/boletos/{id}", get(tickets::list_tickets))
        .route("/boletos/asignar/{id}", post(tickets::assign_tickets))
        .route("/rifas/sorteo/{id}", post(drawing::draw))
        .route("/rifas/sorteo-en-vivo/{id}", post(drawing::draw_live_round))
        .route(
            "/rifas/sorteo-en-vivo/{id}/eventos",
            delete(drawing::clear_live_events),
        )
        .route("/rifas/ganadores/{id}", get(drawing::list_winners))
        .route("/rifas/revertir-sorteo/{id}", put(reversal::revert_raffle))
        .route(
            "/rifas/revertir-ganador/{winner_id}",
            put(reversal::revert_winner),
        )
        .route(
            "/rifas/{id}/revertir-premio/{order}",
            put(reversal::revert_prize),
        )
        .route(
            "/rifas/{id}/revertir-boleto/{code}",
            put(reversal::revert_ticket),
        )
}
