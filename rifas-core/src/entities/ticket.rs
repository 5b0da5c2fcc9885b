use compact_str::CompactString;
use kanau::processor::Processor;
use rifas_sdk::objects::{PublicTicketResponse, TicketResponse};

use crate::entities::raffle::Raffle;
use crate::entities::{RaffleState, TicketState};
use crate::framework::{DatabaseProcessor, lock_raffle};
use crate::store::{Rejection, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub raffle_id: i64,
    pub code: CompactString,
    pub state: TicketState,
    pub buyer_name: Option<String>,
    pub buyer_surname: Option<String>,
    pub buyer_phone: Option<String>,
    pub is_winner: bool,
}

impl From<Ticket> for TicketResponse {
    fn from(value: Ticket) -> Self {
        TicketResponse {
            id: value.id,
            raffle_id: value.raffle_id,
            code: value.code,
            state: value.state.into(),
            buyer_name: value.buyer_name,
            buyer_surname: value.buyer_surname,
            buyer_phone: value.buyer_phone,
            is_winner: value.is_winner,
        }
    }
}

impl From<Ticket> for PublicTicketResponse {
    fn from(value: Ticket) -> Self {
        PublicTicketResponse {
            code: value.code,
            state: value.state.into(),
        }
    }
}

/// Buyer recorded on a sold ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buyer {
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
}

fn map_unique_violation(raffle_id: i64) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Rejection::CodeInUse { raffle_id }.into()
        }
        _ => StoreError::Database(err),
    }
}

/// Insert free tickets for `codes`, `batch_size` rows per statement.
pub(crate) async fn insert_codes(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    raffle_id: i64,
    codes: &[CompactString],
    batch_size: usize,
) -> Result<u64, StoreError> {
    let mut inserted = 0;
    for batch in codes.chunks(batch_size.max(1)) {
        let mut query_builder =
            sqlx::QueryBuilder::new("INSERT INTO tickets (raffle_id, code, state) ");
        query_builder.push_values(batch, |mut b, code| {
            b.push_bind(raffle_id)
                .push_bind(code.to_string())
                .push_bind(TicketState::Free);
        });
        let result = query_builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(map_unique_violation(raffle_id))?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

fn ensure_capacity_unchanged(raffle: &Raffle, expected_count: i32) -> Result<(), StoreError> {
    if raffle.state != RaffleState::Active {
        return Err(Rejection::StateMismatch {
            raffle_id: raffle.id,
            actual: raffle.state,
        }
        .into());
    }
    if raffle.ticket_count != expected_count {
        return Err(Rejection::TicketCountMismatch {
            raffle_id: raffle.id,
        }
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone)]
/// All tickets of a raffle in id order.
pub struct ListTickets {
    pub raffle_id: i64,
}

impl Processor<ListTickets> for DatabaseProcessor {
    type Output = Vec<Ticket>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListTickets")]
    async fn process(&self, query: ListTickets) -> Result<Vec<Ticket>, StoreError> {
        let tickets =
            sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE raffle_id = $1 ORDER BY id")
                .bind(query.raffle_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(tickets)
    }
}

#[derive(Debug, Clone)]
/// Tickets of a raffle in one state, in id order.
pub struct ListTicketsByState {
    pub raffle_id: i64,
    pub state: TicketState,
}

impl Processor<ListTicketsByState> for DatabaseProcessor {
    type Output = Vec<Ticket>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListTicketsByState")]
    async fn process(&self, query: ListTicketsByState) -> Result<Vec<Ticket>, StoreError> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE raffle_id = $1 AND state = $2 ORDER BY id",
        )
        .bind(query.raffle_id)
        .bind(query.state)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }
}

#[derive(Debug, Clone)]
/// Sell `quantity` free tickets to one buyer, lowest ids first.
///
/// All-or-nothing: with fewer free tickets than requested nothing changes and
/// the command fails with [`Rejection::InsufficientFreeTickets`].
pub struct ClaimFreeTickets {
    pub raffle_id: i64,
    pub quantity: u32,
    pub buyer: Buyer,
}

impl Processor<ClaimFreeTickets> for DatabaseProcessor {
    type Output = Vec<Ticket>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ClaimFreeTickets")]
    async fn process(&self, cmd: ClaimFreeTickets) -> Result<Vec<Ticket>, StoreError> {
        let ClaimFreeTickets {
            raffle_id,
            quantity,
            buyer,
        } = cmd;
        let mut tx = self.pool.begin().await?;
        let raffle = lock_raffle(&mut tx, raffle_id).await?;
        if raffle.state != RaffleState::Active {
            return Err(Rejection::StateMismatch {
                raffle_id,
                actual: raffle.state,
            }
            .into());
        }

        let free_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM tickets
            WHERE raffle_id = $1 AND state = 'free'
            ORDER BY id
            LIMIT $2
            FOR UPDATE
            "#,
        )
        .bind(raffle_id)
        .bind(i64::from(quantity))
        .fetch_all(&mut *tx)
        .await?;
        if free_ids.len() < quantity as usize {
            return Err(Rejection::InsufficientFreeTickets {
                raffle_id,
                requested: quantity,
                available: u32::try_from(free_ids.len()).unwrap_or(u32::MAX),
            }
            .into());
        }

        let claimed = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets SET
                state = 'sold',
                buyer_name = $2,
                buyer_surname = $3,
                buyer_phone = $4
            WHERE id = ANY($1)
            RETURNING *
            "#,
        )
        .bind(&free_ids)
        .bind(buyer.name)
        .bind(buyer.surname)
        .bind(buyer.phone)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let mut claimed = claimed;
        claimed.sort_by_key(|ticket| ticket.id);
        Ok(claimed)
    }
}

#[derive(Debug, Clone)]
/// Grow a raffle by one free ticket per code and bump its recorded capacity.
///
/// `expected_count` is the capacity the codes were generated against.
pub struct AppendTickets {
    pub raffle_id: i64,
    pub expected_count: i32,
    pub codes: Vec<CompactString>,
    pub batch_size: usize,
}

impl Processor<AppendTickets> for DatabaseProcessor {
    type Output = Raffle;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:AppendTickets")]
    async fn process(&self, cmd: AppendTickets) -> Result<Raffle, StoreError> {
        let mut tx = self.pool.begin().await?;
        let raffle = lock_raffle(&mut tx, cmd.raffle_id).await?;
        ensure_capacity_unchanged(&raffle, cmd.expected_count)?;

        let added = insert_codes(&mut tx, cmd.raffle_id, &cmd.codes, cmd.batch_size).await?;
        let updated = sqlx::query_as::<_, Raffle>(
            "UPDATE raffles SET ticket_count = ticket_count + $2 WHERE id = $1 RETURNING *",
        )
        .bind(cmd.raffle_id)
        .bind(i32::try_from(added).unwrap_or(i32::MAX))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }
}

#[derive(Debug, Clone)]
/// Shrink a raffle by deleting `quantity` free tickets, most recent first.
///
/// Sold and winning tickets are never removed: when fewer than `quantity`
/// tickets are free nothing changes.
pub struct RemoveFreeTickets {
    pub raffle_id: i64,
    pub expected_count: i32,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedTickets {
    pub raffle: Raffle,
    pub codes: Vec<CompactString>,
}

impl Processor<RemoveFreeTickets> for DatabaseProcessor {
    type Output = RemovedTickets;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:RemoveFreeTickets")]
    async fn process(&self, cmd: RemoveFreeTickets) -> Result<RemovedTickets, StoreError> {
        let mut tx = self.pool.begin().await?;
        let raffle = lock_raffle(&mut tx, cmd.raffle_id).await?;
        ensure_capacity_unchanged(&raffle, cmd.expected_count)?;

        let free_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM tickets
            WHERE raffle_id = $1 AND state = 'free'
            ORDER BY id DESC
            LIMIT $2
            FOR UPDATE
            "#,
        )
        .bind(cmd.raffle_id)
        .bind(i64::from(cmd.quantity))
        .fetch_all(&mut *tx)
        .await?;
        if free_ids.len() < cmd.quantity as usize {
            return Err(Rejection::InsufficientFreeTickets {
                raffle_id: cmd.raffle_id,
                requested: cmd.quantity,
                available: u32::try_from(free_ids.len()).unwrap_or(u32::MAX),
            }
            .into());
        }

        let codes = sqlx::query_scalar::<_, CompactString>(
            "DELETE FROM tickets WHERE id = ANY($1) RETURNING code",
        )
        .bind(&free_ids)
        .fetch_all(&mut *tx)
        .await?;
        let updated = sqlx::query_as::<_, Raffle>(
            "UPDATE raffles SET ticket_count = ticket_count - $2 WHERE id = $1 RETURNING *",
        )
        .bind(cmd.raffle_id)
        .bind(i32::try_from(codes.len()).unwrap_or(i32::MAX))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(RemovedTickets {
            raffle: updated,
            codes,
        })
    }
}
