//! Selling free tickets to buyers.

use tracing::{debug, info};

use super::{ensure_active, load_raffle};
use crate::entities::ticket::{Buyer, ClaimFreeTickets, Ticket};
use crate::error::RaffleError;
use crate::store::RaffleStore;

pub struct AssignmentService<'s, S> {
    store: &'s S,
}

fn clean_buyer(buyer: Buyer) -> Result<Buyer, RaffleError> {
    let name = buyer.name.trim();
    let surname = buyer.surname.trim();
    if name.is_empty() || surname.is_empty() {
        return Err(RaffleError::invalid("buyer name and surname are required"));
    }
    let phone = buyer
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
        .map(str::to_string);
    Ok(Buyer {
        name: name.to_string(),
        surname: surname.to_string(),
        phone,
    })
}

impl<'s, S: RaffleStore> AssignmentService<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Sell `quantity` free tickets of a raffle to `buyer`.
    ///
    /// Either every requested ticket is sold or none is. Concurrent calls
    /// never receive the same ticket.
    pub async fn assign(
        &self,
        raffle_id: i64,
        buyer: Buyer,
        quantity: u32,
    ) -> Result<Vec<Ticket>, RaffleError> {
        if quantity == 0 {
            return Err(RaffleError::invalid("quantity must be a positive integer"));
        }
        let buyer = clean_buyer(buyer)?;
        let raffle = load_raffle(self.store, raffle_id).await?;
        ensure_active(&raffle)?;

        let claimed = self
            .store
            .process(ClaimFreeTickets {
                raffle_id,
                quantity,
                buyer,
            })
            .await
            .map_err(|err| {
                debug!(raffle_id, quantity, error = %err, "Ticket assignment rejected");
                RaffleError::from(err)
            })?;
        info!(raffle_id, assigned = claimed.len(), "Tickets assigned");
        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanau::processor::Processor;
    use crate::entities::TicketState;
    use crate::entities::ticket::{ListTickets, ListTicketsByState};
    use crate::services::testing::{buyer, raffle_with_sales};
    use crate::store::memory::MemoryStore;
    use std::collections::HashSet;

    async fn free_count(store: &MemoryStore, raffle_id: i64) -> usize {
        store
            .process(ListTicketsByState {
                raffle_id,
                state: TicketState::Free,
            })
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn test_assign_stamps_buyer() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 104), 5, 1, 0).await;
        let sold = AssignmentService::new(&store)
            .assign(
                raffle.id,
                Buyer {
                    name: " Ana ".to_string(),
                    surname: "Pérez".to_string(),
                    phone: Some("  ".to_string()),
                },
                3,
            )
            .await
            .unwrap();
        assert_eq!(sold.len(), 3);
        assert!(sold.iter().all(|t| t.state == TicketState::Sold
            && t.buyer_name.as_deref() == Some("Ana")
            && t.buyer_surname.as_deref() == Some("Pérez")
            && t.buyer_phone.is_none()));
        assert_eq!(free_count(&store, raffle.id).await, 2);
    }

    #[tokio::test]
    async fn test_assign_validates_input() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 104), 5, 1, 0).await;
        let service = AssignmentService::new(&store);
        assert!(matches!(
            service.assign(raffle.id, buyer("Ana", "Pérez"), 0).await,
            Err(RaffleError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.assign(raffle.id, buyer("", "Pérez"), 1).await,
            Err(RaffleError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.assign(raffle.id + 100, buyer("Ana", "Pérez"), 1).await,
            Err(RaffleError::NotFound(_))
        ));
        assert_eq!(free_count(&store, raffle.id).await, 5);
    }

    #[tokio::test]
    async fn test_assign_beyond_inventory_changes_nothing() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 104), 5, 1, 4).await;
        let err = AssignmentService::new(&store)
            .assign(raffle.id, buyer("Luis", "Gómez"), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RaffleError::InsufficientInventory {
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(free_count(&store, raffle.id).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_assignments_never_share_tickets() {
        let store = MemoryStore::new();
        let raffle_id = raffle_with_sales(&store, (0, 99), 20, 1, 0).await.id;

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    AssignmentService::new(&store)
                        .assign(raffle_id, buyer(&format!("Cliente {i}"), "Prueba"), 3)
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        let mut failures = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(tickets) => {
                    assert_eq!(tickets.len(), 3);
                    successes += 1;
                }
                Err(err) => {
                    assert!(
                        matches!(err, RaffleError::InsufficientInventory { available: 2, .. }),
                        "unexpected error: {err}"
                    );
                    failures += 1;
                }
            }
        }
        assert_eq!(successes, 6);
        assert_eq!(failures, 4);

        let all = store
            .process(ListTickets { raffle_id })
            .await
            .unwrap();
        let sold: Vec<_> = all
            .iter()
            .filter(|t| t.state == TicketState::Sold)
            .collect();
        assert_eq!(sold.len(), 18);
        let ids: HashSet<i64> = sold.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 18);
        for name in sold.iter().filter_map(|t| t.buyer_name.as_deref()) {
            let count = sold
                .iter()
                .filter(|t| t.buyer_name.as_deref() == Some(name))
                .count();
            assert_eq!(count, 3);
        }
    }

    #[tokio::test]
    async fn test_assign_rejected_after_draw() {
        let store = MemoryStore::new();
        let raffle = raffle_with_sales(&store, (100, 104), 5, 1, 3).await;
        crate::services::drawing::DrawingEngine::new(&store, Default::default())
            .draw(raffle.id, &[], &mut crate::random::ScriptedSource::identity())
            .await
            .unwrap();

        let err = AssignmentService::new(&store)
            .assign(raffle.id, buyer("Luis", "Gómez"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RaffleError::AlreadyDrawn { raffle_id } if raffle_id == raffle.id));
        assert_eq!(free_count(&store, raffle.id).await, 2);
    }
}
