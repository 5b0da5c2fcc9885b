//! Raffle business logic over a [`RaffleStore`].
//!
//! Each service borrows the store and is cheap to build per request.

pub mod assignment;
pub mod capacity;
pub mod drawing;
pub mod generator;
pub mod reversal;

use crate::entities::RaffleState;
use crate::entities::raffle::{GetRaffleById, Raffle};
use crate::error::{RaffleError, Resource};
use crate::store::RaffleStore;

/// Fetch a raffle, failing with [`RaffleError::NotFound`] when it does not exist.
pub async fn load_raffle<S: RaffleStore>(
    store: &S,
    raffle_id: i64,
) -> Result<Raffle, RaffleError> {
    store
        .process(GetRaffleById { raffle_id })
        .await?
        .ok_or(RaffleError::NotFound(Resource::Raffle))
}

/// Sales and capacity changes are only allowed before the first prize is drawn.
pub(crate) fn ensure_active(raffle: &Raffle) -> Result<(), RaffleError> {
    match raffle.state {
        RaffleState::Active => Ok(()),
        RaffleState::InProgress => Err(RaffleError::DrawInProgress {
            raffle_id: raffle.id,
        }),
        RaffleState::Drawn => Err(RaffleError::AlreadyDrawn {
            raffle_id: raffle.id,
        }),
    }
}
