//! Storage seam of the raffle services.
//!
//! Every query and command is a plain struct processed by a
//! [`kanau::processor::Processor`]. [`RaffleStore`] bundles all of them so
//! services can be written once against Postgres ([`DatabaseProcessor`]) and
//! the in-memory [`memory::MemoryStore`].
//!
//! Mutating commands are atomic and serialized per raffle. Commands computed
//! from an earlier read name the state they expect and fail with a
//! [`Rejection`] instead of applying on top of a concurrent change.
//!
//! [`DatabaseProcessor`]: crate::framework::DatabaseProcessor

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use kanau::processor::Processor;

use crate::entities::RaffleState;
use crate::entities::live_draw_event::{DeleteLiveDrawEvents, ListLiveDrawEvents, LiveDrawEvent};
use crate::entities::raffle::{
    CreateRaffle, DeleteRaffle, GetRaffleById, ListRaffles, Raffle, UpdateRaffleDetails,
};
use crate::entities::ticket::{
    AppendTickets, ClaimFreeTickets, ListTickets, ListTicketsByState, RemoveFreeTickets,
    RemovedTickets, Ticket,
};
use crate::entities::winner::{
    DrawRecord, GetWinnerById, ListWinners, RecordDraw, RevertRecord, RevertWinners, Winner,
};

/// A command refused by a store guard. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("raffle {0} does not exist")]
    RaffleNotFound(i64),
    #[error("raffle {raffle_id} is {actual:?}")]
    StateMismatch { raffle_id: i64, actual: RaffleState },
    #[error("raffle {raffle_id} has {available} free tickets, {requested} requested")]
    InsufficientFreeTickets {
        raffle_id: i64,
        requested: u32,
        available: u32,
    },
    #[error("ticket count of raffle {raffle_id} changed")]
    TicketCountMismatch { raffle_id: i64 },
    #[error("ticket code already used in raffle {raffle_id}")]
    CodeInUse { raffle_id: i64 },
    #[error("draw of raffle {raffle_id} no longer matches stored tickets or winners")]
    StaleDraw { raffle_id: i64 },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

/// Everything the raffle services need from storage.
///
/// Implemented for any type that processes every command with [`StoreError`].
pub trait RaffleStore:
    Processor<CreateRaffle, Output = Raffle, Error = StoreError>
    + Processor<GetRaffleById, Output = Option<Raffle>, Error = StoreError>
    + Processor<ListRaffles, Output = Vec<Raffle>, Error = StoreError>
    + Processor<UpdateRaffleDetails, Output = Raffle, Error = StoreError>
    + Processor<DeleteRaffle, Output = bool, Error = StoreError>
    + Processor<ListTickets, Output = Vec<Ticket>, Error = StoreError>
    + Processor<ListTicketsByState, Output = Vec<Ticket>, Error = StoreError>
    + Processor<ClaimFreeTickets, Output = Vec<Ticket>, Error = StoreError>
    + Processor<AppendTickets, Output = Raffle, Error = StoreError>
    + Processor<RemoveFreeTickets, Output = RemovedTickets, Error = StoreError>
    + Processor<ListWinners, Output = Vec<Winner>, Error = StoreError>
    + Processor<GetWinnerById, Output = Option<Winner>, Error = StoreError>
    + Processor<RecordDraw, Output = DrawRecord, Error = StoreError>
    + Processor<RevertWinners, Output = RevertRecord, Error = StoreError>
    + Processor<ListLiveDrawEvents, Output = Vec<LiveDrawEvent>, Error = StoreError>
    + Processor<DeleteLiveDrawEvents, Output = u64, Error = StoreError>
    + Send
    + Sync
{
}

impl<T> RaffleStore for T where
    T: Processor<CreateRaffle, Output = Raffle, Error = StoreError>
        + Processor<GetRaffleById, Output = Option<Raffle>, Error = StoreError>
        + Processor<ListRaffles, Output = Vec<Raffle>, Error = StoreError>
        + Processor<UpdateRaffleDetails, Output = Raffle, Error = StoreError>
        + Processor<DeleteRaffle, Output = bool, Error = StoreError>
        + Processor<ListTickets, Output = Vec<Ticket>, Error = StoreError>
        + Processor<ListTicketsByState, Output = Vec<Ticket>, Error = StoreError>
        + Processor<ClaimFreeTickets, Output = Vec<Ticket>, Error = StoreError>
        + Processor<AppendTickets, Output = Raffle, Error = StoreError>
        + Processor<RemoveFreeTickets, Output = RemovedTickets, Error = StoreError>
        + Processor<ListWinners, Output = Vec<Winner>, Error = StoreError>
        + Processor<GetWinnerById, Output = Option<Winner>, Error = StoreError>
        + Processor<RecordDraw, Output = DrawRecord, Error = StoreError>
        + Processor<RevertWinners, Output = RevertRecord, Error = StoreError>
        + Processor<ListLiveDrawEvents, Output = Vec<LiveDrawEvent>, Error = StoreError>
        + Processor<DeleteLiveDrawEvents, Output = u64, Error = StoreError>
        + Send
        + Sync
{
}
