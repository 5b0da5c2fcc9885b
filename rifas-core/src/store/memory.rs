//! In-memory [`RaffleStore`](super::RaffleStore) for tests and local tooling.
//!
//! One mutex guards every table, so each command is atomic and commands on
//! the same raffle are serialized exactly like the row lock does in Postgres.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use compact_str::CompactString;
use kanau::processor::Processor;

use super::{Rejection, StoreError};
use crate::entities::live_draw_event::{
    DeleteLiveDrawEvents, ListLiveDrawEvents, LiveDrawEvent, LiveDrawEventInsert,
};
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
use crate::entities::{RaffleState, TicketState};
use crate::framework::now_utc;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    raffles: BTreeMap<i64, Raffle>,
    tickets: BTreeMap<i64, Ticket>,
    winners: BTreeMap<i64, Winner>,
    events: BTreeMap<i64, LiveDrawEvent>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn raffle(&self, raffle_id: i64) -> Result<&Raffle, StoreError> {
        self.raffles
            .get(&raffle_id)
            .ok_or(StoreError::Rejected(Rejection::RaffleNotFound(raffle_id)))
    }

    fn raffle_mut(&mut self, raffle_id: i64) -> Result<&mut Raffle, StoreError> {
        self.raffles
            .get_mut(&raffle_id)
            .ok_or(StoreError::Rejected(Rejection::RaffleNotFound(raffle_id)))
    }

    fn expect_state(&self, raffle_id: i64, expected: RaffleState) -> Result<&Raffle, StoreError> {
        let raffle = self.raffle(raffle_id)?;
        if raffle.state != expected {
            return Err(Rejection::StateMismatch {
                raffle_id,
                actual: raffle.state,
            }
            .into());
        }
        Ok(raffle)
    }

    fn expect_capacity(&self, raffle_id: i64, expected_count: i32) -> Result<(), StoreError> {
        let raffle = self.expect_state(raffle_id, RaffleState::Active)?;
        if raffle.ticket_count != expected_count {
            return Err(Rejection::TicketCountMismatch { raffle_id }.into());
        }
        Ok(())
    }

    fn tickets_of(&self, raffle_id: i64) -> impl Iterator<Item = &Ticket> {
        self.tickets.values().filter(move |t| t.raffle_id == raffle_id)
    }

    fn insert_codes(&mut self, raffle_id: i64, codes: &[CompactString]) -> Result<(), StoreError> {
        let duplicate = self
            .tickets_of(raffle_id)
            .any(|t| codes.contains(&t.code))
            || codes
                .iter()
                .enumerate()
                .any(|(i, code)| codes[..i].contains(code));
        if duplicate {
            return Err(Rejection::CodeInUse { raffle_id }.into());
        }
        for code in codes {
            let id = self.next_id();
            self.tickets.insert(
                id,
                Ticket {
                    id,
                    raffle_id,
                    code: code.clone(),
                    state: TicketState::Free,
                    buyer_name: None,
                    buyer_surname: None,
                    buyer_phone: None,
                    is_winner: false,
                },
            );
        }
        Ok(())
    }

    fn insert_event(&mut self, raffle_id: i64, event: LiveDrawEventInsert) -> LiveDrawEvent {
        let id = self.next_id();
        let event = LiveDrawEvent {
            id,
            raffle_id,
            order: event.order,
            step: event.step,
            role: event.role,
            ticket_id: Some(event.ticket_id),
            code: event.code,
            name: event.name,
            surname: event.surname,
            created_at: now_utc(),
        };
        self.events.insert(id, event.clone());
        event
    }
}

/// Shared in-memory store. Clones see the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Processor<CreateRaffle> for MemoryStore {
    type Output = Raffle;
    type Error = StoreError;
    async fn process(&self, cmd: CreateRaffle) -> Result<Raffle, StoreError> {
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let raffle = Raffle {
            id,
            title: cmd.raffle.title,
            description: cmd.raffle.description,
            ticket_count: i32::try_from(cmd.codes.len()).unwrap_or(i32::MAX),
            price: cmd.raffle.price,
            prize_count: cmd.raffle.prize_count,
            visibility: cmd.raffle.visibility,
            state: RaffleState::Active,
            winning_code: None,
            image_url: cmd.raffle.image_url,
            created_at: now_utc(),
        };
        tables.insert_codes(id, &cmd.codes)?;
        tables.raffles.insert(id, raffle.clone());
        Ok(raffle)
    }
}

impl Processor<GetRaffleById> for MemoryStore {
    type Output = Option<Raffle>;
    type Error = StoreError;
    async fn process(&self, query: GetRaffleById) -> Result<Option<Raffle>, StoreError> {
        Ok(self.lock()?.raffles.get(&query.raffle_id).cloned())
    }
}

impl Processor<ListRaffles> for MemoryStore {
    type Output = Vec<Raffle>;
    type Error = StoreError;
    async fn process(&self, query: ListRaffles) -> Result<Vec<Raffle>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .raffles
            .values()
            .rev()
            .filter(|r| query.visibility.is_none_or(|v| r.visibility == v))
            .cloned()
            .collect())
    }
}

impl Processor<UpdateRaffleDetails> for MemoryStore {
    type Output = Raffle;
    type Error = StoreError;
    async fn process(&self, cmd: UpdateRaffleDetails) -> Result<Raffle, StoreError> {
        let mut tables = self.lock()?;
        if let Some(required) = cmd.require_state {
            tables.expect_state(cmd.raffle_id, required)?;
        }
        let raffle = tables.raffle_mut(cmd.raffle_id)?;
        if let Some(title) = cmd.title {
            raffle.title = title;
        }
        if let Some(description) = cmd.description {
            raffle.description = Some(description);
        }
        if let Some(price) = cmd.price {
            raffle.price = price;
        }
        if let Some(prize_count) = cmd.prize_count {
            raffle.prize_count = prize_count;
        }
        if let Some(visibility) = cmd.visibility {
            raffle.visibility = visibility;
        }
        if let Some(image_url) = cmd.image_url {
            raffle.image_url = Some(image_url);
        }
        Ok(raffle.clone())
    }
}

impl Processor<DeleteRaffle> for MemoryStore {
    type Output = bool;
    type Error = StoreError;
    async fn process(&self, cmd: DeleteRaffle) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        let raffle_id = cmd.raffle_id;
        if tables.raffles.remove(&raffle_id).is_none() {
            return Ok(false);
        }
        tables.tickets.retain(|_, t| t.raffle_id != raffle_id);
        tables.winners.retain(|_, w| w.raffle_id != raffle_id);
        tables.events.retain(|_, e| e.raffle_id != raffle_id);
        Ok(true)
    }
}

impl Processor<ListTickets> for MemoryStore {
    type Output = Vec<Ticket>;
    type Error = StoreError;
    async fn process(&self, query: ListTickets) -> Result<Vec<Ticket>, StoreError> {
        Ok(self.lock()?.tickets_of(query.raffle_id).cloned().collect())
    }
}

impl Processor<ListTicketsByState> for MemoryStore {
    type Output = Vec<Ticket>;
    type Error = StoreError;
    async fn process(&self, query: ListTicketsByState) -> Result<Vec<Ticket>, StoreError> {
        Ok(self
            .lock()?
            .tickets_of(query.raffle_id)
            .filter(|t| t.state == query.state)
            .cloned()
            .collect())
    }
}

impl Processor<ClaimFreeTickets> for MemoryStore {
    type Output = Vec<Ticket>;
    type Error = StoreError;
    async fn process(&self, cmd: ClaimFreeTickets) -> Result<Vec<Ticket>, StoreError> {
        let mut tables = self.lock()?;
        let raffle_id = cmd.raffle_id;
        tables.expect_state(raffle_id, RaffleState::Active)?;

        let free_ids: Vec<i64> = tables
            .tickets_of(raffle_id)
            .filter(|t| t.state == TicketState::Free)
            .map(|t| t.id)
            .take(cmd.quantity as usize)
            .collect();
        if free_ids.len() < cmd.quantity as usize {
            return Err(Rejection::InsufficientFreeTickets {
                raffle_id,
                requested: cmd.quantity,
                available: u32::try_from(free_ids.len()).unwrap_or(u32::MAX),
            }
            .into());
        }

        let mut claimed = Vec::with_capacity(free_ids.len());
        for id in free_ids {
            if let Some(ticket) = tables.tickets.get_mut(&id) {
                ticket.state = TicketState::Sold;
                ticket.buyer_name = Some(cmd.buyer.name.clone());
                ticket.buyer_surname = Some(cmd.buyer.surname.clone());
                ticket.buyer_phone = cmd.buyer.phone.clone();
                claimed.push(ticket.clone());
            }
        }
        Ok(claimed)
    }
}

impl Processor<AppendTickets> for MemoryStore {
    type Output = Raffle;
    type Error = StoreError;
    async fn process(&self, cmd: AppendTickets) -> Result<Raffle, StoreError> {
        let mut tables = self.lock()?;
        tables.expect_capacity(cmd.raffle_id, cmd.expected_count)?;
        tables.insert_codes(cmd.raffle_id, &cmd.codes)?;
        let raffle = tables.raffle_mut(cmd.raffle_id)?;
        raffle.ticket_count += i32::try_from(cmd.codes.len()).unwrap_or(i32::MAX);
        Ok(raffle.clone())
    }
}

impl Processor<RemoveFreeTickets> for MemoryStore {
    type Output = RemovedTickets;
    type Error = StoreError;
    async fn process(&self, cmd: RemoveFreeTickets) -> Result<RemovedTickets, StoreError> {
        let mut tables = self.lock()?;
        let raffle_id = cmd.raffle_id;
        tables.expect_capacity(raffle_id, cmd.expected_count)?;

        let free_ids: Vec<i64> = tables
            .tickets_of(raffle_id)
            .filter(|t| t.state == TicketState::Free)
            .map(|t| t.id)
            .collect();
        if free_ids.len() < cmd.quantity as usize {
            return Err(Rejection::InsufficientFreeTickets {
                raffle_id,
                requested: cmd.quantity,
                available: u32::try_from(free_ids.len()).unwrap_or(u32::MAX),
            }
            .into());
        }

        let codes: Vec<CompactString> = free_ids
            .iter()
            .rev()
            .take(cmd.quantity as usize)
            .filter_map(|id| tables.tickets.remove(id))
            .map(|t| t.code)
            .collect();
        let raffle = tables.raffle_mut(raffle_id)?;
        raffle.ticket_count -= i32::try_from(codes.len()).unwrap_or(i32::MAX);
        Ok(RemovedTickets {
            raffle: raffle.clone(),
            codes,
        })
    }
}

impl Processor<ListWinners> for MemoryStore {
    type Output = Vec<Winner>;
    type Error = StoreError;
    async fn process(&self, query: ListWinners) -> Result<Vec<Winner>, StoreError> {
        let tables = self.lock()?;
        let mut winners: Vec<Winner> = tables
            .winners
            .values()
            .filter(|w| w.raffle_id == query.raffle_id)
            .cloned()
            .collect();
        winners.sort_by_key(|w| w.order);
        Ok(winners)
    }
}

impl Processor<GetWinnerById> for MemoryStore {
    type Output = Option<Winner>;
    type Error = StoreError;
    async fn process(&self, query: GetWinnerById) -> Result<Option<Winner>, StoreError> {
        Ok(self.lock()?.winners.get(&query.winner_id).cloned())
    }
}

impl Processor<RecordDraw> for MemoryStore {
    type Output = DrawRecord;
    type Error = StoreError;
    async fn process(&self, cmd: RecordDraw) -> Result<DrawRecord, StoreError> {
        let mut tables = self.lock()?;
        let raffle_id = cmd.raffle_id;
        tables.expect_state(raffle_id, cmd.expected_state)?;

        let tickets_sold = cmd.winners.iter().all(|w| {
            tables
                .tickets
                .get(&w.ticket_id)
                .is_some_and(|t| t.raffle_id == raffle_id && t.state == TicketState::Sold)
        });
        let orders_free = cmd.winners.iter().all(|w| {
            !tables
                .winners
                .values()
                .any(|existing| existing.raffle_id == raffle_id && existing.order == w.order)
        });
        if !tickets_sold || !orders_free {
            return Err(Rejection::StaleDraw { raffle_id }.into());
        }

        let mut winners = Vec::with_capacity(cmd.winners.len());
        for insert in cmd.winners {
            if let Some(ticket) = tables.tickets.get_mut(&insert.ticket_id) {
                ticket.state = TicketState::Winner;
                ticket.is_winner = true;
            }
            let id = tables.next_id();
            let winner = Winner {
                id,
                raffle_id,
                ticket_id: Some(insert.ticket_id),
                order: insert.order,
                code: insert.code,
                name: insert.name,
                surname: insert.surname,
                phone: insert.phone,
                product_id: insert.product_id,
                created_at: now_utc(),
            };
            tables.winners.insert(id, winner.clone());
            winners.push(winner);
        }
        let events = cmd
            .events
            .into_iter()
            .map(|event| tables.insert_event(raffle_id, event))
            .collect();

        let raffle = tables.raffle_mut(raffle_id)?;
        raffle.state = cmd.new_state;
        if let Some(code) = cmd.winning_code {
            raffle.winning_code = Some(code);
        }
        Ok(DrawRecord {
            raffle: raffle.clone(),
            winners,
            events,
        })
    }
}

impl Processor<RevertWinners> for MemoryStore {
    type Output = RevertRecord;
    type Error = StoreError;
    async fn process(&self, cmd: RevertWinners) -> Result<RevertRecord, StoreError> {
        let mut tables = self.lock()?;
        let raffle_id = cmd.raffle_id;
        tables.expect_state(raffle_id, cmd.expected_state)?;

        let all_present = cmd.winner_ids.iter().all(|id| {
            tables
                .winners
                .get(id)
                .is_some_and(|w| w.raffle_id == raffle_id)
        });
        if !all_present {
            return Err(Rejection::StaleDraw { raffle_id }.into());
        }

        let mut removed: Vec<Winner> = cmd
            .winner_ids
            .iter()
            .filter_map(|id| tables.winners.remove(id))
            .collect();
        removed.sort_by_key(|w| w.order);

        for ticket in tables.tickets.values_mut() {
            if ticket.raffle_id == raffle_id
                && ticket.state == TicketState::Winner
                && removed.iter().any(|w| w.code == ticket.code)
            {
                ticket.state = TicketState::Sold;
                ticket.is_winner = false;
            }
        }
        tables.events.retain(|_, e| {
            e.raffle_id != raffle_id
                || (!cmd.drop_all_events && !removed.iter().any(|w| w.order == e.order))
        });

        let raffle = tables.raffle_mut(raffle_id)?;
        raffle.state = cmd.new_state;
        if cmd.clear_winning_code {
            raffle.winning_code = None;
        }
        Ok(RevertRecord {
            raffle: raffle.clone(),
            removed,
        })
    }
}

impl Processor<ListLiveDrawEvents> for MemoryStore {
    type Output = Vec<LiveDrawEvent>;
    type Error = StoreError;
    async fn process(&self, query: ListLiveDrawEvents) -> Result<Vec<LiveDrawEvent>, StoreError> {
        let tables = self.lock()?;
        let mut events: Vec<LiveDrawEvent> = tables
            .events
            .values()
            .filter(|e| e.raffle_id == query.raffle_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.order, e.step));
        Ok(events)
    }
}

impl Processor<DeleteLiveDrawEvents> for MemoryStore {
    type Output = u64;
    type Error = StoreError;
    async fn process(&self, cmd: DeleteLiveDrawEvents) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        let before = tables.events.len();
        tables.events.retain(|_, e| e.raffle_id != cmd.raffle_id);
        Ok((before - tables.events.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::RaffleVisibility;
    use crate::entities::raffle::RaffleInsert;
    use crate::entities::ticket::Buyer;
    use crate::entities::winner::WinnerInsert;
    use rust_decimal::Decimal;

    fn insert(title: &str) -> RaffleInsert {
        RaffleInsert {
            title: title.to_string(),
            description: None,
            price: Decimal::ZERO,
            prize_count: 1,
            visibility: RaffleVisibility::Public,
            image_url: None,
        }
    }

    fn codes(list: &[&str]) -> Vec<CompactString> {
        list.iter().map(|c| CompactString::from(*c)).collect()
    }

    async fn raffle_with(store: &MemoryStore, list: &[&str]) -> Raffle {
        store
            .process(CreateRaffle {
                raffle: insert("Canasta"),
                codes: codes(list),
                batch_size: 300,
            })
            .await
            .unwrap()
    }

    fn buyer() -> Buyer {
        Buyer {
            name: "Ana".to_string(),
            surname: "Pérez".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_codes_are_rejected() {
        let store = MemoryStore::new();
        let raffle = raffle_with(&store, &["001", "002"]).await;
        let err = store
            .process(AppendTickets {
                raffle_id: raffle.id,
                expected_count: 2,
                codes: codes(&["003", "001"]),
                batch_size: 300,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(Rejection::CodeInUse { .. })
        ));
        let tickets = store
            .process(ListTickets {
                raffle_id: raffle.id,
            })
            .await
            .unwrap();
        assert_eq!(tickets.len(), 2);
    }

    #[tokio::test]
    async fn test_claim_is_all_or_nothing() {
        let store = MemoryStore::new();
        let raffle = raffle_with(&store, &["001", "002", "003"]).await;
        let err = store
            .process(ClaimFreeTickets {
                raffle_id: raffle.id,
                quantity: 4,
                buyer: buyer(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(Rejection::InsufficientFreeTickets { available: 3, .. })
        ));
        let free = store
            .process(ListTicketsByState {
                raffle_id: raffle.id,
                state: TicketState::Free,
            })
            .await
            .unwrap();
        assert_eq!(free.len(), 3);
    }

    #[tokio::test]
    async fn test_record_draw_applies_once() {
        let store = MemoryStore::new();
        let raffle = raffle_with(&store, &["001", "002"]).await;
        let sold = store
            .process(ClaimFreeTickets {
                raffle_id: raffle.id,
                quantity: 2,
                buyer: buyer(),
            })
            .await
            .unwrap();
        let draw = |ticket: &Ticket| RecordDraw {
            raffle_id: raffle.id,
            expected_state: RaffleState::Active,
            winners: vec![WinnerInsert::from_ticket(ticket, 1, None)],
            events: vec![],
            new_state: RaffleState::Drawn,
            winning_code: Some(ticket.code.clone()),
        };

        let first = store.process(draw(&sold[0])).await.unwrap();
        assert_eq!(first.raffle.state, RaffleState::Drawn);
        assert_eq!(first.raffle.winning_code.as_deref(), Some("001"));

        let second = store.process(draw(&sold[1])).await.unwrap_err();
        assert!(matches!(
            second,
            StoreError::Rejected(Rejection::StateMismatch {
                actual: RaffleState::Drawn,
                ..
            })
        ));
        let winners = store
            .process(ListWinners {
                raffle_id: raffle.id,
            })
            .await
            .unwrap();
        assert_eq!(winners.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = MemoryStore::new();
        let kept = raffle_with(&store, &["001"]).await;
        let deleted = raffle_with(&store, &["001", "002"]).await;
        assert!(
            store
                .process(DeleteRaffle {
                    raffle_id: deleted.id
                })
                .await
                .unwrap()
        );
        assert!(
            !store
                .process(DeleteRaffle {
                    raffle_id: deleted.id
                })
                .await
                .unwrap()
        );
        let remaining = store
            .process(ListTickets { raffle_id: kept.id })
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        let listed = store.process(ListRaffles::default()).await.unwrap();
        assert_eq!(listed, vec![kept]);
    }
}
