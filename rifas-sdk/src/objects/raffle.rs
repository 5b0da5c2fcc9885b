//! Raffle request and response types.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{RaffleState, RaffleVisibility};

/// `POST /administrador/crearRifas` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRaffleRequest {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "cantidad_boletos")]
    pub ticket_count: u32,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "condicion", default)]
    pub visibility: Option<RaffleVisibility>,
    #[serde(rename = "precio", default)]
    pub price: Option<Decimal>,
    #[serde(rename = "cantidad_premios", default)]
    pub prize_count: Option<u32>,
    #[serde(rename = "imagen_url", default)]
    pub image_url: Option<String>,
}

/// `PUT /administrador/editarRifa/{id}` body. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRaffleRequest {
    #[serde(rename = "titulo", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "cantidad_boletos", default, skip_serializing_if = "Option::is_none")]
    pub ticket_count: Option<u32>,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "condicion", default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<RaffleVisibility>,
    #[serde(rename = "precio", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(rename = "cantidad_premios", default, skip_serializing_if = "Option::is_none")]
    pub prize_count: Option<u32>,
    #[serde(rename = "imagen_url", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaffleResponse {
    #[serde(rename = "id_rifas")]
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "cantidad_boletos")]
    pub ticket_count: u32,
    #[serde(rename = "precio")]
    pub price: Decimal,
    #[serde(rename = "cantidad_premios")]
    pub prize_count: u32,
    #[serde(rename = "condicion")]
    pub visibility: RaffleVisibility,
    #[serde(rename = "estado")]
    pub state: RaffleState,
    #[serde(rename = "numero_ganador")]
    pub winning_code: Option<CompactString>,
    #[serde(rename = "imagen_url")]
    pub image_url: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRaffleResponse {
    #[serde(rename = "rifa")]
    pub raffle: RaffleResponse,
    #[serde(rename = "boletos")]
    pub codes: Vec<CompactString>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRaffleResponse {
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "id_rifas")]
    pub id: i64,
}
