use std::fmt;

use crate::store::{Rejection, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Raffle,
    Winner,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Raffle => "raffle",
            Resource::Winner => "winner",
        })
    }
}

/// Errors of the raffle services.
#[derive(Debug, thiserror::Error)]
pub enum RaffleError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("raffle {raffle_id} is already drawn")]
    AlreadyDrawn { raffle_id: i64 },
    #[error("raffle {raffle_id} has a draw in progress")]
    DrawInProgress { raffle_id: i64 },
    #[error("raffle {raffle_id} has no drawn prizes")]
    NotDrawn { raffle_id: i64 },
    #[error("{requested} tickets requested but only {available} are free")]
    InsufficientInventory { requested: u32, available: u32 },
    #[error("drawing needs {required} sold tickets but only {available} are sold")]
    InsufficientSoldTickets { required: u32, available: u32 },
    #[error("cannot remove {requested} tickets, only {removable} are free")]
    CapacityConflict { requested: u32, removable: u32 },
    #[error("raffle {raffle_id} changed while the request was processed")]
    StaleState { raffle_id: i64 },
    #[error("all {prize_count} prizes of raffle {raffle_id} are already drawn")]
    AllPrizesDrawn { raffle_id: i64, prize_count: u32 },
    #[error("storage error: {0}")]
    Storage(StoreError),
}

/// Coarse category of a [`RaffleError`], used to pick the API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    AllPrizesDrawn,
    Storage,
}

impl RaffleError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RaffleError::InvalidArgument(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RaffleError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RaffleError::NotFound(_) => ErrorKind::NotFound,
            RaffleError::AlreadyDrawn { .. }
            | RaffleError::DrawInProgress { .. }
            | RaffleError::NotDrawn { .. }
            | RaffleError::InsufficientInventory { .. }
            | RaffleError::InsufficientSoldTickets { .. }
            | RaffleError::CapacityConflict { .. }
            | RaffleError::StaleState { .. } => ErrorKind::Conflict,
            RaffleError::AllPrizesDrawn { .. } => ErrorKind::AllPrizesDrawn,
            RaffleError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<StoreError> for RaffleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Rejected(rejection) => rejection.into(),
            other => RaffleError::Storage(other),
        }
    }
}

impl From<Rejection> for RaffleError {
    fn from(value: Rejection) -> Self {
        match value {
            Rejection::RaffleNotFound(_) => RaffleError::NotFound(Resource::Raffle),
            Rejection::InsufficientFreeTickets {
                requested,
                available,
                ..
            } => RaffleError::InsufficientInventory {
                requested,
                available,
            },
            Rejection::StateMismatch { raffle_id, .. }
            | Rejection::TicketCountMismatch { raffle_id }
            | Rejection::CodeInUse { raffle_id }
            | Rejection::StaleDraw { raffle_id } => RaffleError::StaleState { raffle_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RaffleState;

    #[test]
    fn test_rejections_map_to_conflicts() {
        let err: RaffleError = StoreError::Rejected(Rejection::StateMismatch {
            raffle_id: 3,
            actual: RaffleState::Drawn,
        })
        .into();
        assert!(matches!(err, RaffleError::StaleState { raffle_id: 3 }));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: RaffleError = StoreError::Rejected(Rejection::RaffleNotFound(3)).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_storage_failures_stay_storage() {
        let err: RaffleError = StoreError::Poisoned.into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        let err: RaffleError = StoreError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_all_prizes_drawn_has_its_own_kind() {
        let err = RaffleError::AllPrizesDrawn {
            raffle_id: 1,
            prize_count: 3,
        };
        assert_eq!(err.kind(), ErrorKind::AllPrizesDrawn);
    }
}
