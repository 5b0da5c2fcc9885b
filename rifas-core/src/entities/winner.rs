use compact_str::CompactString;
use kanau::processor::Processor;
use rifas_sdk::objects::{PublicWinnerResponse, WinnerResponse};

use crate::entities::live_draw_event::{LiveDrawEvent, LiveDrawEventInsert};
use crate::entities::raffle::Raffle;
use crate::entities::ticket::Ticket;
use crate::entities::{RaffleState, unix_seconds};
use crate::framework::{DatabaseProcessor, lock_raffle};
use crate::store::{Rejection, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Winner {
    pub id: i64,
    pub raffle_id: i64,
    pub ticket_id: Option<i64>,
    /// Prize order, 1-based and unique within the raffle.
    #[sqlx(rename = "prize_order")]
    pub order: i32,
    pub code: CompactString,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub product_id: Option<i64>,
    pub created_at: time::PrimitiveDateTime,
}

impl From<Winner> for WinnerResponse {
    fn from(value: Winner) -> Self {
        WinnerResponse {
            id: value.id,
            raffle_id: value.raffle_id,
            ticket_id: value.ticket_id,
            order: value.order.unsigned_abs(),
            code: value.code,
            name: value.name,
            surname: value.surname,
            phone: value.phone,
            product_id: value.product_id,
            created_at: unix_seconds(value.created_at),
        }
    }
}

impl From<Winner> for PublicWinnerResponse {
    fn from(value: Winner) -> Self {
        PublicWinnerResponse {
            order: value.order.unsigned_abs(),
            code: value.code,
            name: value.name,
            surname: value.surname,
            product_id: value.product_id,
        }
    }
}

/// A winner about to be recorded, with the buyer snapshot taken from its ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerInsert {
    pub ticket_id: i64,
    pub order: i32,
    pub code: CompactString,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub product_id: Option<i64>,
}

impl WinnerInsert {
    pub fn from_ticket(ticket: &Ticket, order: i32, product_id: Option<i64>) -> Self {
        WinnerInsert {
            ticket_id: ticket.id,
            order,
            code: ticket.code.clone(),
            name: ticket.buyer_name.clone(),
            surname: ticket.buyer_surname.clone(),
            phone: ticket.buyer_phone.clone(),
            product_id,
        }
    }
}

#[derive(Debug, Clone)]
/// Winner records of a raffle ordered by prize order.
pub struct ListWinners {
    pub raffle_id: i64,
}

impl Processor<ListWinners> for DatabaseProcessor {
    type Output = Vec<Winner>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListWinners")]
    async fn process(&self, query: ListWinners) -> Result<Vec<Winner>, StoreError> {
        let winners = sqlx::query_as::<_, Winner>(
            "SELECT * FROM winners WHERE raffle_id = $1 ORDER BY prize_order",
        )
        .bind(query.raffle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(winners)
    }
}

#[derive(Debug, Clone)]
pub struct GetWinnerById {
    pub winner_id: i64,
}

impl Processor<GetWinnerById> for DatabaseProcessor {
    type Output = Option<Winner>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:GetWinnerById")]
    async fn process(&self, query: GetWinnerById) -> Result<Option<Winner>, StoreError> {
        let winner = sqlx::query_as::<_, Winner>("SELECT * FROM winners WHERE id = $1")
            .bind(query.winner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(winner)
    }
}

#[derive(Debug, Clone)]
/// Commit the result of a draw computed from an earlier read.
///
/// Applies only if the raffle is still in `expected_state`, every winning
/// ticket is still `sold` and none of the prize orders is taken. Otherwise the
/// whole draw is rejected and nothing changes.
pub struct RecordDraw {
    pub raffle_id: i64,
    pub expected_state: RaffleState,
    pub winners: Vec<WinnerInsert>,
    pub events: Vec<LiveDrawEventInsert>,
    pub new_state: RaffleState,
    /// Written to the raffle when set, left untouched otherwise.
    pub winning_code: Option<CompactString>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub raffle: Raffle,
    pub winners: Vec<Winner>,
    pub events: Vec<LiveDrawEvent>,
}

impl Processor<RecordDraw> for DatabaseProcessor {
    type Output = DrawRecord;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:RecordDraw")]
    async fn process(&self, cmd: RecordDraw) -> Result<DrawRecord, StoreError> {
        let raffle_id = cmd.raffle_id;
        let stale = || StoreError::from(Rejection::StaleDraw { raffle_id });

        let mut tx = self.pool.begin().await?;
        let raffle = lock_raffle(&mut tx, raffle_id).await?;
        if raffle.state != cmd.expected_state {
            return Err(Rejection::StateMismatch {
                raffle_id,
                actual: raffle.state,
            }
            .into());
        }

        let ticket_ids: Vec<i64> = cmd.winners.iter().map(|w| w.ticket_id).collect();
        let marked = sqlx::query(
            r#"
            UPDATE tickets SET state = 'winner', is_winner = TRUE
            WHERE raffle_id = $1 AND id = ANY($2) AND state = 'sold'
            "#,
        )
        .bind(raffle_id)
        .bind(&ticket_ids)
        .execute(&mut *tx)
        .await?;
        if marked.rows_affected() != ticket_ids.len() as u64 {
            return Err(stale());
        }

        let mut winners = Vec::with_capacity(cmd.winners.len());
        for winner in cmd.winners {
            let inserted = sqlx::query_as::<_, Winner>(
                r#"
                INSERT INTO winners
                    (raffle_id, ticket_id, prize_order, code, name, surname, phone, product_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (raffle_id, prize_order) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(raffle_id)
            .bind(winner.ticket_id)
            .bind(winner.order)
            .bind(winner.code.as_str())
            .bind(winner.name)
            .bind(winner.surname)
            .bind(winner.phone)
            .bind(winner.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(stale)?;
            winners.push(inserted);
        }

        let mut events = Vec::with_capacity(cmd.events.len());
        for event in cmd.events {
            events.push(event.insert(&mut tx, raffle_id).await?);
        }

        let raffle = sqlx::query_as::<_, Raffle>(
            r#"
            UPDATE raffles SET state = $2, winning_code = COALESCE($3, winning_code)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(raffle_id)
        .bind(cmd.new_state)
        .bind(cmd.winning_code.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(DrawRecord {
            raffle,
            winners,
            events,
        })
    }
}

#[derive(Debug, Clone)]
/// Undo a set of winner records of one raffle.
///
/// Deletes the winners, returns their tickets to `sold` and drops the live
/// events of their prize orders (or every live event of the raffle when
/// `drop_all_events` is set). Applies only while the raffle is in
/// `expected_state` and every listed winner still exists.
pub struct RevertWinners {
    pub raffle_id: i64,
    pub expected_state: RaffleState,
    pub winner_ids: Vec<i64>,
    pub new_state: RaffleState,
    pub clear_winning_code: bool,
    pub drop_all_events: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertRecord {
    pub raffle: Raffle,
    pub removed: Vec<Winner>,
}

impl Processor<RevertWinners> for DatabaseProcessor {
    type Output = RevertRecord;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:RevertWinners")]
    async fn process(&self, cmd: RevertWinners) -> Result<RevertRecord, StoreError> {
        let raffle_id = cmd.raffle_id;
        let mut tx = self.pool.begin().await?;
        let raffle = lock_raffle(&mut tx, raffle_id).await?;
        if raffle.state != cmd.expected_state {
            return Err(Rejection::StateMismatch {
                raffle_id,
                actual: raffle.state,
            }
            .into());
        }

        let mut removed = sqlx::query_as::<_, Winner>(
            "DELETE FROM winners WHERE raffle_id = $1 AND id = ANY($2) RETURNING *",
        )
        .bind(raffle_id)
        .bind(&cmd.winner_ids)
        .fetch_all(&mut *tx)
        .await?;
        if removed.len() != cmd.winner_ids.len() {
            return Err(Rejection::StaleDraw { raffle_id }.into());
        }
        removed.sort_by_key(|winner| winner.order);

        let codes: Vec<String> = removed.iter().map(|w| w.code.to_string()).collect();
        sqlx::query(
            r#"
            UPDATE tickets SET state = 'sold', is_winner = FALSE
            WHERE raffle_id = $1 AND code = ANY($2) AND state = 'winner'
            "#,
        )
        .bind(raffle_id)
        .bind(&codes)
        .execute(&mut *tx)
        .await?;

        if cmd.drop_all_events {
            sqlx::query("DELETE FROM live_draw_events WHERE raffle_id = $1")
                .bind(raffle_id)
                .execute(&mut *tx)
                .await?;
        } else {
            let orders: Vec<i32> = removed.iter().map(|w| w.order).collect();
            sqlx::query(
                "DELETE FROM live_draw_events WHERE raffle_id = $1 AND prize_order = ANY($2)",
            )
            .bind(raffle_id)
            .bind(&orders)
            .execute(&mut *tx)
            .await?;
        }

        let raffle = sqlx::query_as::<_, Raffle>(
            r#"
            UPDATE raffles SET
                state = $2,
                winning_code = CASE WHEN $3 THEN NULL ELSE winning_code END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(raffle_id)
        .bind(cmd.new_state)
        .bind(cmd.clear_winning_code)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(RevertRecord { raffle, removed })
    }
}
