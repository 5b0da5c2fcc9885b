//! Drawing and reversal request and response types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::LiveDrawRole;
use super::raffle::RaffleResponse;

/// Optional body of `POST /administrador/rifas/sorteo/{id}`.
///
/// `products[i]` is attached to the winner of prize order `i + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRequest {
    #[serde(rename = "productos", default)]
    pub products: Vec<i64>,
}

/// Optional body of `POST /administrador/rifas/sorteo-en-vivo/{rifaId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveDrawRequest {
    #[serde(rename = "producto_id", default)]
    pub product_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerResponse {
    #[serde(rename = "id_ganador")]
    pub id: i64,
    #[serde(rename = "rifa_id")]
    pub raffle_id: i64,
    #[serde(rename = "boleto_id")]
    pub ticket_id: Option<i64>,
    #[serde(rename = "orden")]
    pub order: u32,
    #[serde(rename = "numero_ganador")]
    pub code: CompactString,
    #[serde(rename = "nombre_ganador")]
    pub name: Option<String>,
    #[serde(rename = "apellido_ganador")]
    pub surname: Option<String>,
    #[serde(rename = "telefono_ganador")]
    pub phone: Option<String>,
    #[serde(rename = "producto_id")]
    pub product_id: Option<i64>,
    pub created_at: i64,
}

/// Winner as shown on the public routes: no phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicWinnerResponse {
    #[serde(rename = "orden")]
    pub order: u32,
    #[serde(rename = "numero_ganador")]
    pub code: CompactString,
    #[serde(rename = "nombre_ganador")]
    pub name: Option<String>,
    #[serde(rename = "apellido_ganador")]
    pub surname: Option<String>,
    #[serde(rename = "producto_id")]
    pub product_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResponse {
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "ganadores")]
    pub winners: Vec<WinnerResponse>,
    #[serde(rename = "rifa")]
    pub raffle: RaffleResponse,
}

/// One reveal step of a live draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveDrawEventResponse {
    #[serde(rename = "orden")]
    pub order: u32,
    #[serde(rename = "paso")]
    pub step: u32,
    #[serde(rename = "rol")]
    pub role: LiveDrawRole,
    #[serde(rename = "numero_boleto")]
    pub code: CompactString,
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "apellido")]
    pub surname: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveDrawResponse {
    /// Prize order drawn by this round.
    #[serde(rename = "premio")]
    pub order: u32,
    #[serde(rename = "ganador")]
    pub winner: WinnerResponse,
    /// Losers in reveal order.
    #[serde(rename = "perdedores")]
    pub losers: Vec<LiveDrawEventResponse>,
    #[serde(rename = "premios_restantes")]
    pub remaining_prizes: u32,
    #[serde(rename = "rifa")]
    pub raffle: RaffleResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertResponse {
    #[serde(rename = "mensaje")]
    pub message: String,
    /// Codes of the tickets returned to `sold`.
    #[serde(rename = "boletos_revertidos")]
    pub reverted_codes: Vec<CompactString>,
    #[serde(rename = "rifa")]
    pub raffle: RaffleResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEventsCleanupResponse {
    #[serde(rename = "eliminados")]
    pub deleted: u64,
}
