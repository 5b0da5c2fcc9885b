pub mod drawing;
pub mod raffle;
pub mod ticket;

pub use drawing::{
    DrawRequest, DrawResponse, LiveDrawEventResponse, LiveDrawRequest, LiveDrawResponse,
    LiveEventsCleanupResponse, PublicWinnerResponse, RevertResponse, WinnerResponse,
};
pub use raffle::{
    CreateRaffleRequest, CreateRaffleResponse, DeleteRaffleResponse, EditRaffleRequest,
    RaffleResponse,
};
pub use ticket::{AssignTicketsRequest, AssignTicketsResponse, PublicTicketResponse, TicketResponse};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a raffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaffleState {
    Active,
    InProgress,
    Drawn,
}

/// Whether a raffle is listed on the public routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaffleVisibility {
    #[default]
    #[serde(rename = "publica")]
    Public,
    #[serde(rename = "oculta")]
    Hidden,
}

/// State of a single ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    Free,
    Sold,
    Winner,
}

/// Role of a ticket revealed during a live draw round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveDrawRole {
    Loser,
    Winner,
}

/// Error categories reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidArgument,
    Unauthorized,
    NotFound,
    Conflict,
    AllPrizesDrawn,
    StorageError,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorCategory,
    pub message: String,
}
