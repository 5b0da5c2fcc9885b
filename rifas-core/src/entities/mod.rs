pub mod live_draw_event;
pub mod raffle;
pub mod ticket;
pub mod winner;

use rifas_sdk::objects::{
    LiveDrawRole as SdkLiveDrawRole, RaffleState as SdkRaffleState,
    RaffleVisibility as SdkRaffleVisibility, TicketState as SdkTicketState,
};

/// Raffle lifecycle state for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `rifas_sdk::objects::RaffleState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "raffle_state")]
pub enum RaffleState {
    /// Open for sales, no prize drawn.
    Active,
    /// Some prizes drawn, others pending.
    InProgress,
    /// Every prize drawn.
    Drawn,
}

impl From<RaffleState> for SdkRaffleState {
    fn from(value: RaffleState) -> Self {
        match value {
            RaffleState::Active => SdkRaffleState::Active,
            RaffleState::InProgress => SdkRaffleState::InProgress,
            RaffleState::Drawn => SdkRaffleState::Drawn,
        }
    }
}

impl From<SdkRaffleState> for RaffleState {
    fn from(value: SdkRaffleState) -> Self {
        match value {
            SdkRaffleState::Active => RaffleState::Active,
            SdkRaffleState::InProgress => RaffleState::InProgress,
            SdkRaffleState::Drawn => RaffleState::Drawn,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "raffle_visibility")]
pub enum RaffleVisibility {
    #[default]
    Public,
    Hidden,
}

impl From<RaffleVisibility> for SdkRaffleVisibility {
    fn from(value: RaffleVisibility) -> Self {
        match value {
            RaffleVisibility::Public => SdkRaffleVisibility::Public,
            RaffleVisibility::Hidden => SdkRaffleVisibility::Hidden,
        }
    }
}

impl From<SdkRaffleVisibility> for RaffleVisibility {
    fn from(value: SdkRaffleVisibility) -> Self {
        match value {
            SdkRaffleVisibility::Public => RaffleVisibility::Public,
            SdkRaffleVisibility::Hidden => RaffleVisibility::Hidden,
        }
    }
}

/// Ticket state for database operations.
///
/// `Free` tickets carry no buyer, `Sold` and `Winner` tickets always do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "ticket_state")]
pub enum TicketState {
    Free,
    Sold,
    Winner,
}

impl From<TicketState> for SdkTicketState {
    fn from(value: TicketState) -> Self {
        match value {
            TicketState::Free => SdkTicketState::Free,
            TicketState::Sold => SdkTicketState::Sold,
            TicketState::Winner => SdkTicketState::Winner,
        }
    }
}

impl From<SdkTicketState> for TicketState {
    fn from(value: SdkTicketState) -> Self {
        match value {
            SdkTicketState::Free => TicketState::Free,
            SdkTicketState::Sold => TicketState::Sold,
            SdkTicketState::Winner => TicketState::Winner,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "live_draw_role")]
pub enum LiveDrawRole {
    Loser,
    Winner,
}

impl From<LiveDrawRole> for SdkLiveDrawRole {
    fn from(value: LiveDrawRole) -> Self {
        match value {
            LiveDrawRole::Loser => SdkLiveDrawRole::Loser,
            LiveDrawRole::Winner => SdkLiveDrawRole::Winner,
        }
    }
}

/// Convert a `TIMESTAMP` column into unix seconds, treating it as UTC.
pub fn unix_seconds(at: time::PrimitiveDateTime) -> i64 {
    at.assume_utc().unix_timestamp()
}
