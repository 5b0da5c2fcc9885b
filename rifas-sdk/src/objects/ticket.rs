//! Ticket request and response types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::TicketState;

/// `POST /administrador/boletos/asignar/{rifaId}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignTicketsRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignTicketsResponse {
    #[serde(rename = "asignados")]
    pub assigned: u32,
    #[serde(rename = "boletos")]
    pub codes: Vec<CompactString>,
}

/// Full ticket detail for the admin API (includes buyer data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketResponse {
    #[serde(rename = "id_boletos")]
    pub id: i64,
    #[serde(rename = "rifa_id")]
    pub raffle_id: i64,
    #[serde(rename = "numero_boleto")]
    pub code: CompactString,
    #[serde(rename = "estado")]
    pub state: TicketState,
    #[serde(rename = "nombre_cliente")]
    pub buyer_name: Option<String>,
    #[serde(rename = "apellido_cliente")]
    pub buyer_surname: Option<String>,
    #[serde(rename = "telefono_cliente")]
    pub buyer_phone: Option<String>,
    #[serde(rename = "ganador")]
    pub is_winner: bool,
}

/// Ticket as shown on the public routes: no buyer data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicTicketResponse {
    #[serde(rename = "numero_boleto")]
    pub code: CompactString,
    #[serde(rename = "estado")]
    pub state: TicketState,
}
