//! Undoing draws.
//!
//! A reversal restores the tickets, winners, live events and raffle state
//! that existed before the reverted draw.

use itertools::Itertools;
use tracing::info;

use super::load_raffle;
use crate::entities::RaffleState;
use crate::entities::raffle::Raffle;
use crate::entities::winner::{GetWinnerById, ListWinners, RevertRecord, RevertWinners, Winner};
use crate::error::{RaffleError, Resource};
use crate::store::RaffleStore;

pub struct ReversalService<'s, S> {
    store: &'s S,
}

impl<'s, S: RaffleStore> ReversalService<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Undo every prize of a raffle and return it to `active`.
    pub async fn revert_raffle(&self, raffle_id: i64) -> Result<RevertRecord, RaffleError> {
        let raffle = load_raffle(self.store, raffle_id).await?;
        let winners = self.store.process(ListWinners { raffle_id }).await?;
        if winners.is_empty() {
            return Err(RaffleError::NotDrawn { raffle_id });
        }

        let record = self
            .store
            .process(RevertWinners {
                raffle_id,
                expected_state: raffle.state,
                winner_ids: winners.iter().map(|w| w.id).collect(),
                new_state: RaffleState::Active,
                clear_winning_code: true,
                drop_all_events: true,
            })
            .await?;
        info!(
            raffle_id,
            codes = %record.removed.iter().map(|w| w.code.as_str()).join(","),
            "Draw reverted"
        );
        Ok(record)
    }

    /// Undo the prize with the given order.
    pub async fn revert_order(
        &self,
        raffle_id: i64,
        order: u32,
    ) -> Result<RevertRecord, RaffleError> {
        let raffle = load_raffle(self.store, raffle_id).await?;
        let winners = self.store.process(ListWinners { raffle_id }).await?;
        let target = winners
            .iter()
            .find(|w| i64::from(w.order) == i64::from(order))
            .ok_or(RaffleError::NotFound(Resource::Winner))?
            .id;
        self.revert_one(&raffle, &winners, target).await
    }

    /// Undo the prize recorded under `winner_id`.
    pub async fn revert_winner(&self, winner_id: i64) -> Result<RevertRecord, RaffleError> {
        let winner = self
            .store
            .process(GetWinnerById { winner_id })
            .await?
            .ok_or(RaffleError::NotFound(Resource::Winner))?;
        let raffle = load_raffle(self.store, winner.raffle_id).await?;
        let winners = self
            .store
            .process(ListWinners {
                raffle_id: raffle.id,
            })
            .await?;
        self.revert_one(&raffle, &winners, winner.id).await
    }

    /// Undo the prize won by ticket `code`.
    pub async fn revert_code(
        &self,
        raffle_id: i64,
        code: &str,
    ) -> Result<RevertRecord, RaffleError> {
        let raffle = load_raffle(self.store, raffle_id).await?;
        let winners = self.store.process(ListWinners { raffle_id }).await?;
        let target = winners
            .iter()
            .find(|w| w.code == code)
            .ok_or(RaffleError::NotFound(Resource::Winner))?
            .id;
        self.revert_one(&raffle, &winners, target).await
    }

    async fn revert_one(
        &self,
        raffle: &Raffle,
        winners: &[Winner],
        winner_id: i64,
    ) -> Result<RevertRecord, RaffleError> {
        let reverted_order = winners
            .iter()
            .find(|w| w.id == winner_id)
            .map(|w| w.order)
            .ok_or(RaffleError::NotFound(Resource::Winner))?;
        let remaining = winners.len() - 1;
        let new_state = if remaining == 0 {
            RaffleState::Active
        } else {
            RaffleState::InProgress
        };

        let record = self
            .store
            .process(RevertWinners {
                raffle_id: raffle.id,
                expected_state: raffle.state,
                winner_ids: vec![winner_id],
                new_state,
                clear_winning_code: reverted_order == 1 || remaining == 0,
                drop_all_events: false,
            })
            .await?;
        info!(
            raffle_id = raffle.id,
            order = reverted_order,
            remaining,
            "Prize reverted"
        );
        Ok(record)
    }
}
