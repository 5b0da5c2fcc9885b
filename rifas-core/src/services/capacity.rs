//! Raffle creation and capacity reconciliation.

use compact_str::CompactString;
use rust_decimal::Decimal;
use tracing::{debug, info};

use super::generator::{generate_codes, generate_unused_codes};
use super::{ensure_active, load_raffle};
use crate::config::TicketConfig;
use crate::entities::raffle::{
    CreateRaffle, DeleteRaffle, Raffle, RaffleInsert, UpdateRaffleDetails,
};
use crate::entities::ticket::{AppendTickets, ListTickets, RemoveFreeTickets};
use crate::entities::{RaffleState, RaffleVisibility};
use crate::error::{RaffleError, Resource};
use crate::random::RandomSource;
use crate::store::{RaffleStore, Rejection, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRaffle {
    pub title: String,
    pub description: Option<String>,
    pub ticket_count: u32,
    pub price: Decimal,
    pub prize_count: u32,
    pub visibility: RaffleVisibility,
    pub image_url: Option<String>,
}

/// Requested edits. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaffleChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ticket_count: Option<u32>,
    pub price: Option<Decimal>,
    pub prize_count: Option<u32>,
    pub visibility: Option<RaffleVisibility>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRaffle {
    pub raffle: Raffle,
    /// Generated codes in generation order.
    pub codes: Vec<CompactString>,
}

pub struct CapacityManager<'s, S> {
    store: &'s S,
    tickets: TicketConfig,
}

fn clean_title(title: String) -> Result<String, RaffleError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(RaffleError::invalid("title must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn check_price(price: Decimal) -> Result<(), RaffleError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(RaffleError::invalid("price must not be negative"));
    }
    Ok(())
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl<'s, S: RaffleStore> CapacityManager<'s, S> {
    pub fn new(store: &'s S, tickets: TicketConfig) -> Self {
        Self { store, tickets }
    }

    fn check_ticket_count(&self, ticket_count: u32) -> Result<(), RaffleError> {
        let size = self.tickets.universe.size();
        if ticket_count == 0 || ticket_count as usize > size {
            return Err(RaffleError::invalid(format!(
                "ticket count must be between 1 and {size}"
            )));
        }
        Ok(())
    }

    /// Create a raffle and its `ticket_count` free tickets.
    pub async fn create(
        &self,
        raffle: NewRaffle,
        source: &mut impl RandomSource,
    ) -> Result<CreatedRaffle, RaffleError> {
        let title = clean_title(raffle.title)?;
        self.check_ticket_count(raffle.ticket_count)?;
        check_price(raffle.price)?;
        if raffle.prize_count == 0 || raffle.prize_count > raffle.ticket_count {
            return Err(RaffleError::invalid(
                "prize count must be between 1 and the ticket count",
            ));
        }

        let codes = generate_codes(&self.tickets.universe, raffle.ticket_count, source)?;
        let created = self
            .store
            .process(CreateRaffle {
                raffle: RaffleInsert {
                    title,
                    description: raffle.description,
                    price: raffle.price,
                    prize_count: to_i32(raffle.prize_count),
                    visibility: raffle.visibility,
                    image_url: raffle.image_url,
                },
                codes: codes.clone(),
                batch_size: self.tickets.batch_size,
            })
            .await?;
        info!(
            raffle_id = created.id,
            tickets = codes.len(),
            "Raffle created"
        );
        Ok(CreatedRaffle {
            raffle: created,
            codes,
        })
    }

    /// Apply `changes`, resizing the ticket pool when the ticket count changes.
    ///
    /// Capacity and prize count only change while the raffle is active. The
    /// descriptive fields are always written, even when nothing else changed.
    pub async fn edit(
        &self,
        raffle_id: i64,
        changes: RaffleChanges,
        source: &mut impl RandomSource,
    ) -> Result<Raffle, RaffleError> {
        let title = changes.title.map(clean_title).transpose()?;
        if let Some(price) = changes.price {
            check_price(price)?;
        }
        if let Some(ticket_count) = changes.ticket_count {
            self.check_ticket_count(ticket_count)?;
        }
        if changes.prize_count == Some(0) {
            return Err(RaffleError::invalid("prize count must be at least 1"));
        }

        let mut raffle = load_raffle(self.store, raffle_id).await?;
        let capacity = changes.ticket_count.unwrap_or(raffle.capacity());
        let prizes = changes.prize_count.unwrap_or(raffle.prizes());
        if prizes > capacity {
            return Err(RaffleError::invalid(format!(
                "{prizes} prizes do not fit in {capacity} tickets"
            )));
        }

        if capacity != raffle.capacity() {
            ensure_active(&raffle)?;
            raffle = self.reconcile(&raffle, capacity, source).await?;
        }
        let prize_change = changes.prize_count.filter(|p| *p != raffle.prizes());
        if prize_change.is_some() {
            ensure_active(&raffle)?;
        }

        let updated = self
            .store
            .process(UpdateRaffleDetails {
                raffle_id,
                title,
                description: changes.description,
                price: changes.price,
                prize_count: prize_change.map(to_i32),
                visibility: changes.visibility,
                image_url: changes.image_url,
                require_state: prize_change.map(|_| RaffleState::Active),
            })
            .await?;
        Ok(updated)
    }

    /// Grow or shrink the ticket pool of `raffle` to `target` tickets.
    ///
    /// Growing draws new codes from the unused part of the universe.
    /// Shrinking deletes free tickets only and fails with
    /// [`RaffleError::CapacityConflict`] when not enough of them exist.
    pub async fn reconcile(
        &self,
        raffle: &Raffle,
        target: u32,
        source: &mut impl RandomSource,
    ) -> Result<Raffle, RaffleError> {
        let current = raffle.capacity();
        if target > current {
            let existing = self
                .store
                .process(ListTickets {
                    raffle_id: raffle.id,
                })
                .await?;
            let codes = generate_unused_codes(
                &self.tickets.universe,
                target - current,
                existing.iter().map(|t| t.code.as_str()),
                source,
            )?;
            let updated = self
                .store
                .process(AppendTickets {
                    raffle_id: raffle.id,
                    expected_count: raffle.ticket_count,
                    codes,
                    batch_size: self.tickets.batch_size,
                })
                .await?;
            info!(
                raffle_id = raffle.id,
                from = current,
                to = updated.capacity(),
                "Raffle capacity increased"
            );
            Ok(updated)
        } else if target < current {
            let removed = self
                .store
                .process(RemoveFreeTickets {
                    raffle_id: raffle.id,
                    expected_count: raffle.ticket_count,
                    quantity: current - target,
                })
                .await
                .map_err(|err| match err {
                    StoreError::Rejected(Rejection::InsufficientFreeTickets {
                        requested,
                        available,
                        ..
                    }) => {
                        debug!(
                            raffle_id = raffle.id,
                            requested, available, "Capacity reduction rejected"
                        );
                        RaffleError::CapacityConflict {
                            requested,
                            removable: available,
                        }
                    }
                    other => other.into(),
                })?;
            info!(
                raffle_id = raffle.id,
                from = current,
                to = removed.raffle.capacity(),
                "Raffle capacity reduced"
            );
            Ok(removed.raffle)
        } else {
            Ok(raffle.clone())
        }
    }

    /// Delete a raffle with its tickets, winners and live events.
    pub async fn delete(&self, raffle_id: i64) -> Result<(), RaffleError> {
        let deleted = self.store.process(DeleteRaffle { raffle_id }).await?;
        if !deleted {
            return Err(RaffleError::NotFound(Resource::Raffle));
        }
        info!(raffle_id, "Raffle deleted");
        Ok(())
    }
}
