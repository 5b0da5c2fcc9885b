//! Winner selection.
//!
//! Three policies share one eligible pool (the `sold` tickets of a raffle)
//! and one Fisher–Yates shuffle:
//!
//! - **simple**: one prize, the first shuffled ticket wins;
//! - **batch**: every prize at once, walking the shuffled pool in blocks of
//!   `losers_per_prize + 1` and taking the last ticket of each block;
//! - **live**: one prize per call, revealing the losers of the round before
//!   its winner as [`LiveDrawEvent`]s.
//!
//! Draws are computed from a read of the raffle and committed with
//! [`RecordDraw`], which refuses to apply if the raffle changed in between.

use itertools::Itertools;
use tracing::{debug, info};

use super::load_raffle;
use crate::config::DrawingConfig;
use crate::entities::live_draw_event::{
    DeleteLiveDrawEvents, ListLiveDrawEvents, LiveDrawEvent, LiveDrawEventInsert,
};
use crate::entities::raffle::Raffle;
use crate::entities::ticket::{ListTicketsByState, Ticket};
use crate::entities::winner::{DrawRecord, ListWinners, RecordDraw, Winner, WinnerInsert};
use crate::entities::{LiveDrawRole, RaffleState, TicketState};
use crate::error::RaffleError;
use crate::random::{RandomSource, shuffle};
use crate::store::RaffleStore;

/// Result of a single live round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRound {
    /// Prize order drawn by the round.
    pub order: u32,
    pub winner: Winner,
    /// Loser reveals, in step order.
    pub losers: Vec<LiveDrawEvent>,
    pub remaining_prizes: u32,
    pub raffle: Raffle,
}

pub struct DrawingEngine<'s, S> {
    store: &'s S,
    config: DrawingConfig,
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Simple and batch draws need a raffle with no prize drawn yet.
fn ensure_undrawn(raffle: &Raffle) -> Result<(), RaffleError> {
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

/// Lowest prize order in `1..=prize_count` without a winner.
fn next_open_order(winners: &[Winner], prize_count: u32) -> Option<u32> {
    (1..=prize_count).find(|order| !winners.iter().any(|w| w.order == to_i32(*order)))
}

impl<'s, S: RaffleStore> DrawingEngine<'s, S> {
    pub fn new(store: &'s S, config: DrawingConfig) -> Self {
        Self { store, config }
    }

    async fn eligible_tickets(&self, raffle_id: i64) -> Result<Vec<Ticket>, RaffleError> {
        Ok(self
            .store
            .process(ListTicketsByState {
                raffle_id,
                state: TicketState::Sold,
            })
            .await?)
    }

    /// Draw every prize of a raffle: a simple draw for raffles with one
    /// prize, a batch draw otherwise.
    ///
    /// `products[i]` is attached to the winner of prize order `i + 1`.
    pub async fn draw(
        &self,
        raffle_id: i64,
        products: &[i64],
        source: &mut impl RandomSource,
    ) -> Result<DrawRecord, RaffleError> {
        let raffle = load_raffle(self.store, raffle_id).await?;
        if products.len() > raffle.prizes().max(1) as usize {
            return Err(RaffleError::invalid(format!(
                "{} products given for {} prizes",
                products.len(),
                raffle.prizes()
            )));
        }
        if raffle.prizes() <= 1 {
            self.draw_simple(&raffle, products.first().copied(), source)
                .await
        } else {
            self.draw_batch(&raffle, products, source).await
        }
    }

    /// One winner out of every sold ticket.
    pub async fn draw_simple(
        &self,
        raffle: &Raffle,
        product_id: Option<i64>,
        source: &mut impl RandomSource,
    ) -> Result<DrawRecord, RaffleError> {
        ensure_undrawn(raffle)?;
        let mut eligible = self.eligible_tickets(raffle.id).await?;
        if eligible.is_empty() {
            return Err(RaffleError::InsufficientSoldTickets {
                required: 1,
                available: 0,
            });
        }
        shuffle(&mut eligible, source);
        let winner = WinnerInsert::from_ticket(&eligible[0], 1, product_id);
        let code = winner.code.clone();

        let record = self
            .store
            .process(RecordDraw {
                raffle_id: raffle.id,
                expected_state: raffle.state,
                winners: vec![winner],
                events: Vec::new(),
                new_state: RaffleState::Drawn,
                winning_code: Some(code.clone()),
            })
            .await?;
        info!(raffle_id = raffle.id, %code, "Raffle drawn");
        Ok(record)
    }

    /// Every prize at once out of one shuffle of the sold tickets.
    ///
    /// Needs `prize_count * (losers_per_prize + 1)` sold tickets.
    pub async fn draw_batch(
        &self,
        raffle: &Raffle,
        products: &[i64],
        source: &mut impl RandomSource,
    ) -> Result<DrawRecord, RaffleError> {
        ensure_undrawn(raffle)?;
        let prizes = raffle.prizes().max(1);
        let block = self.config.block_size();
        let required = prizes.saturating_mul(block);

        let mut eligible = self.eligible_tickets(raffle.id).await?;
        let available = u32::try_from(eligible.len()).unwrap_or(u32::MAX);
        if available < required {
            debug!(
                raffle_id = raffle.id,
                required, available, "Batch draw rejected"
            );
            return Err(RaffleError::InsufficientSoldTickets {
                required,
                available,
            });
        }
        shuffle(&mut eligible, source);

        let winners = eligible
            .chunks_exact(block as usize)
            .take(prizes as usize)
            .zip(1..)
            .filter_map(|(chunk, order)| {
                chunk.last().map(|ticket| {
                    WinnerInsert::from_ticket(
                        ticket,
                        order,
                        products.get((order - 1) as usize).copied(),
                    )
                })
            })
            .collect_vec();
        let winning_code = winners.first().map(|w| w.code.clone());

        let record = self
            .store
            .process(RecordDraw {
                raffle_id: raffle.id,
                expected_state: raffle.state,
                winners,
                events: Vec::new(),
                new_state: RaffleState::Drawn,
                winning_code,
            })
            .await?;
        info!(
            raffle_id = raffle.id,
            prizes,
            codes = %record.winners.iter().map(|w| w.code.as_str()).join(","),
            "Raffle drawn in batch"
        );
        Ok(record)
    }

    /// Draw the next open prize order of a raffle, revealing its losers first.
    pub async fn draw_live_round(
        &self,
        raffle_id: i64,
        product_id: Option<i64>,
        source: &mut impl RandomSource,
    ) -> Result<LiveRound, RaffleError> {
        let raffle = load_raffle(self.store, raffle_id).await?;
        let prizes = raffle.prizes().max(1);
        let existing = self.store.process(ListWinners { raffle_id }).await?;
        let Some(order) = next_open_order(&existing, prizes) else {
            return Err(RaffleError::AllPrizesDrawn {
                raffle_id,
                prize_count: prizes,
            });
        };
        if raffle.state == RaffleState::Drawn {
            return Err(RaffleError::AlreadyDrawn { raffle_id });
        }

        let losers_per_prize = self.config.losers_per_prize as usize;
        let required = self.config.block_size();
        let mut eligible = self.eligible_tickets(raffle_id).await?;
        let available = u32::try_from(eligible.len()).unwrap_or(u32::MAX);
        if available < required {
            debug!(raffle_id, order, required, available, "Live round rejected");
            return Err(RaffleError::InsufficientSoldTickets {
                required,
                available,
            });
        }
        shuffle(&mut eligible, source);

        let order_i32 = to_i32(order);
        let winning_ticket = &eligible[losers_per_prize];
        let events = eligible[..losers_per_prize]
            .iter()
            .map(|ticket| (ticket, LiveDrawRole::Loser))
            .chain(std::iter::once((winning_ticket, LiveDrawRole::Winner)))
            .zip(1..)
            .map(|((ticket, role), step)| {
                LiveDrawEventInsert::from_ticket(ticket, order_i32, step, role)
            })
            .collect_vec();

        let drawn_after = u32::try_from(existing.len()).unwrap_or(u32::MAX) + 1;
        let remaining_prizes = prizes.saturating_sub(drawn_after);
        let new_state = if remaining_prizes == 0 {
            RaffleState::Drawn
        } else {
            RaffleState::InProgress
        };

        let record = self
            .store
            .process(RecordDraw {
                raffle_id,
                expected_state: raffle.state,
                winners: vec![WinnerInsert::from_ticket(
                    winning_ticket,
                    order_i32,
                    product_id,
                )],
                events,
                new_state,
                winning_code: (order == 1).then(|| winning_ticket.code.clone()),
            })
            .await?;

        let DrawRecord {
            raffle,
            winners,
            events,
        } = record;
        let winner = winners
            .into_iter()
            .next()
            .ok_or(RaffleError::StaleState { raffle_id })?;
        info!(
            raffle_id,
            order,
            code = %winner.code,
            remaining_prizes,
            "Live round drawn"
        );
        Ok(LiveRound {
            order,
            winner,
            losers: events
                .into_iter()
                .filter(|e| e.role == LiveDrawRole::Loser)
                .collect(),
            remaining_prizes,
            raffle,
        })
    }

    /// Live events of a raffle in replay order.
    pub async fn live_events(&self, raffle_id: i64) -> Result<Vec<LiveDrawEvent>, RaffleError> {
        load_raffle(self.store, raffle_id).await?;
        Ok(self.store.process(ListLiveDrawEvents { raffle_id }).await?)
    }

    /// Drop the live events of a raffle, keeping its winners.
    pub async fn clear_live_events(&self, raffle_id: i64) -> Result<u64, RaffleError> {
        load_raffle(self.store, raffle_id).await?;
        let deleted = self.store.process(DeleteLiveDrawEvents { raffle_id }).await?;
        info!(raffle_id, deleted, "Live draw events cleared");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanau::processor::Processor;
    use crate::entities::ticket::ListTickets;
    use crate::random::{RngSource, ScriptedSource};
    use crate::services::testing::raffle_with_sales;
    use crate::store::memory::MemoryStore;
    use std::collections::HashSet;

    fn engine(store: &MemoryStore) -> DrawingEngine<'_, MemoryStore> {
        DrawingEngine::new(store, DrawingConfig::default())
    }

    async fn ticket_state(store: &MemoryStore, raffle_id: i64, code: &str) -> TicketState {
        store
            .process(ListTickets { raffle_id })
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.code == code)
            .map(|t| t.state)
            .unwrap()
    }

    #[tokio::test]
    async fn test_simple_draw_picks_first_shuffled_ticket() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 104), 5, 1, 3).await;
        let record = engine(&store)
            .draw(raffle.id, &[], &mut ScriptedSource::new(vec![0.0]))
            .await
            .unwrap();

        // Zero samples rotate [100, 101, 102] into [101, 102, 100].
        assert_eq!(record.winners.len(), 1);
        let winner = &record.winners[0];
        assert_eq!(winner.order, 1);
        assert_eq!(winner.code, "101");
        assert_eq!(winner.name.as_deref(), Some("Ana"));
        assert_eq!(record.raffle.state, RaffleState::Drawn);
        assert_eq!(record.raffle.winning_code.as_deref(), Some("101"));
        assert_eq!(
            ticket_state(&store, raffle.id, "101").await,
            TicketState::Winner
        );
    }

    #[tokio::test]
    async fn test_simple_draw_needs_sold_tickets() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 104), 5, 1, 0).await;
        assert!(matches!(
            engine(&store)
                .draw(raffle.id, &[], &mut ScriptedSource::identity())
                .await,
            Err(RaffleError::InsufficientSoldTickets {
                required: 1,
                available: 0
            })
        ));
    }

    #[tokio::test]
    async fn test_drawn_raffle_cannot_be_drawn_again() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 104), 5, 1, 3).await;
        let engine = engine(&store);
        let mut source = ScriptedSource::identity();
        engine.draw(raffle.id, &[], &mut source).await.unwrap();
        assert!(matches!(
            engine.draw(raffle.id, &[], &mut source).await,
            Err(RaffleError::AlreadyDrawn { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_draw_with_seven_sold_tickets() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 109), 10, 2, 7).await;
        let record = engine(&store)
            .draw(raffle.id, &[11, 12], &mut ScriptedSource::identity())
            .await
            .unwrap();

        let orders: Vec<i32> = record.winners.iter().map(|w| w.order).collect();
        assert_eq!(orders, vec![1, 2]);
        // Identity shuffle: blocks [100, 101, 102] and [103, 104, 105].
        let codes: Vec<&str> = record.winners.iter().map(|w| w.code.as_str()).collect();
        assert_eq!(codes, vec!["102", "105"]);
        assert_eq!(record.winners[0].product_id, Some(11));
        assert_eq!(record.winners[1].product_id, Some(12));
        assert_eq!(record.raffle.state, RaffleState::Drawn);
        assert_eq!(record.raffle.winning_code.as_deref(), Some("102"));
    }

    #[tokio::test]
    async fn test_batch_draw_with_five_sold_tickets_conflicts() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 109), 10, 2, 5).await;
        let err = engine(&store)
            .draw(raffle.id, &[], &mut ScriptedSource::identity())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RaffleError::InsufficientSoldTickets {
                required: 6,
                available: 5
            }
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
        let winners = store
            .process(ListWinners {
                raffle_id: raffle.id,
            })
            .await
            .unwrap();
        assert!(winners.is_empty());
    }

    #[tokio::test]
    async fn test_batch_winners_are_distinct_for_random_shuffles() {
        for seed in 0..20 {
            let store = MemoryStore::new();
            let raffle = raffle_with_sales(&store, (0, 99), 40, 4, 30).await;
            let record = engine(&store)
                .draw(raffle.id, &[], &mut RngSource::seeded(seed))
                .await
                .unwrap();
            assert_eq!(record.winners.len(), 4);
            let tickets: HashSet<Option<i64>> =
                record.winners.iter().map(|w| w.ticket_id).collect();
            assert_eq!(tickets.len(), 4);
        }
    }

    #[tokio::test]
    async fn test_live_rounds_fill_prizes_in_order() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 109), 10, 2, 7).await;
        let engine = engine(&store);
        let mut source = ScriptedSource::identity();

        let first = engine
            .draw_live_round(raffle.id, Some(3), &mut source)
            .await
            .unwrap();
        assert_eq!(first.order, 1);
        assert_eq!(first.winner.code, "102");
        assert_eq!(first.winner.product_id, Some(3));
        let losers: Vec<&str> = first.losers.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(losers, vec!["100", "101"]);
        assert_eq!(first.remaining_prizes, 1);
        assert_eq!(first.raffle.state, RaffleState::InProgress);
        assert_eq!(first.raffle.winning_code.as_deref(), Some("102"));

        assert!(matches!(
            engine.draw(raffle.id, &[], &mut source).await,
            Err(RaffleError::DrawInProgress { .. })
        ));

        // The winner of round 1 is no longer eligible.
        let second = engine
            .draw_live_round(raffle.id, None, &mut source)
            .await
            .unwrap();
        assert_eq!(second.order, 2);
        assert_eq!(second.winner.code, "103");
        assert_eq!(second.remaining_prizes, 0);
        assert_eq!(second.raffle.state, RaffleState::Drawn);
        assert_eq!(second.raffle.winning_code.as_deref(), Some("102"));

        assert!(matches!(
            engine.draw_live_round(raffle.id, None, &mut source).await,
            Err(RaffleError::AllPrizesDrawn { prize_count: 2, .. })
        ));

        let events = engine.live_events(raffle.id).await.unwrap();
        assert_eq!(events.len(), 6);
        let replay: Vec<(i32, i32, LiveDrawRole)> =
            events.iter().map(|e| (e.order, e.step, e.role)).collect();
        assert_eq!(replay[2], (1, 3, LiveDrawRole::Winner));
        assert_eq!(replay[3], (2, 1, LiveDrawRole::Loser));

        assert_eq!(engine.clear_live_events(raffle.id).await.unwrap(), 6);
        assert!(engine.live_events(raffle.id).await.unwrap().is_empty());
        let winners = store
            .process(ListWinners {
                raffle_id: raffle.id,
            })
            .await
            .unwrap();
        assert_eq!(winners.len(), 2);
    }

    #[tokio::test]
    async fn test_live_round_needs_a_full_block() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 109), 10, 3, 2).await;
        assert!(matches!(
            engine(&store)
                .draw_live_round(raffle.id, None, &mut ScriptedSource::identity())
                .await,
            Err(RaffleError::InsufficientSoldTickets {
                required: 3,
                available: 2
            })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_draws_record_one_winner() {
        let store = MemoryStore::new();
        let raffle_id = raffle_with_sales(&store, (0, 99), 30, 1, 20).await.id;

        let handles: Vec<_> = (0..8)
            .map(|seed| {
                let store = store.clone();
                tokio::spawn(async move {
                    DrawingEngine::new(&store, DrawingConfig::default())
                        .draw(raffle_id, &[], &mut RngSource::seeded(seed))
                        .await
                })
            })
            .collect();

        let mut drawn = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => drawn += 1,
                Err(err) => assert!(
                    matches!(
                        err,
                        RaffleError::AlreadyDrawn { .. } | RaffleError::StaleState { .. }
                    ),
                    "unexpected error: {err}"
                ),
            }
        }
        assert_eq!(drawn, 1);
        let winners = store.process(ListWinners { raffle_id }).await.unwrap();
        assert_eq!(winners.len(), 1);
    }
}
