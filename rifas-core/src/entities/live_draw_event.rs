use compact_str::CompactString;
use kanau::processor::Processor;
use rifas_sdk::objects::LiveDrawEventResponse;

use crate::entities::ticket::Ticket;
use crate::entities::{LiveDrawRole, unix_seconds};
use crate::framework::DatabaseProcessor;
use crate::store::StoreError;

/// One reveal step of a live draw round. Steps of a round start at 1.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LiveDrawEvent {
    pub id: i64,
    pub raffle_id: i64,
    #[sqlx(rename = "prize_order")]
    pub order: i32,
    pub step: i32,
    pub role: LiveDrawRole,
    pub ticket_id: Option<i64>,
    pub code: CompactString,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub created_at: time::PrimitiveDateTime,
}

impl From<LiveDrawEvent> for LiveDrawEventResponse {
    fn from(value: LiveDrawEvent) -> Self {
        LiveDrawEventResponse {
            order: value.order.unsigned_abs(),
            step: value.step.unsigned_abs(),
            role: value.role.into(),
            code: value.code,
            name: value.name,
            surname: value.surname,
            created_at: unix_seconds(value.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveDrawEventInsert {
    pub order: i32,
    pub step: i32,
    pub role: LiveDrawRole,
    pub ticket_id: i64,
    pub code: CompactString,
    pub name: Option<String>,
    pub surname: Option<String>,
}

impl LiveDrawEventInsert {
    pub fn from_ticket(ticket: &Ticket, order: i32, step: i32, role: LiveDrawRole) -> Self {
        LiveDrawEventInsert {
            order,
            step,
            role,
            ticket_id: ticket.id,
            code: ticket.code.clone(),
            name: ticket.buyer_name.clone(),
            surname: ticket.buyer_surname.clone(),
        }
    }

    pub(crate) async fn insert(
        self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        raffle_id: i64,
    ) -> Result<LiveDrawEvent, sqlx::Error> {
        sqlx::query_as::<_, LiveDrawEvent>(
            r#"
            INSERT INTO live_draw_events
                (raffle_id, prize_order, step, role, ticket_id, code, name, surname)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(raffle_id)
        .bind(self.order)
        .bind(self.step)
        .bind(self.role)
        .bind(self.ticket_id)
        .bind(self.code.as_str())
        .bind(self.name)
        .bind(self.surname)
        .fetch_one(&mut **tx)
        .await
    }
}

#[derive(Debug, Clone)]
/// Live events of a raffle ordered by prize order, then step.
pub struct ListLiveDrawEvents {
    pub raffle_id: i64,
}

impl Processor<ListLiveDrawEvents> for DatabaseProcessor {
    type Output = Vec<LiveDrawEvent>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListLiveDrawEvents")]
    async fn process(&self, query: ListLiveDrawEvents) -> Result<Vec<LiveDrawEvent>, StoreError> {
        let events = sqlx::query_as::<_, LiveDrawEvent>(
            "SELECT * FROM live_draw_events WHERE raffle_id = $1 ORDER BY prize_order, step",
        )
        .bind(query.raffle_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[derive(Debug, Clone)]
/// Drop every live event of a raffle. Winners are untouched.
pub struct DeleteLiveDrawEvents {
    pub raffle_id: i64,
}

impl Processor<DeleteLiveDrawEvents> for DatabaseProcessor {
    type Output = u64;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteLiveDrawEvents")]
    async fn process(&self, cmd: DeleteLiveDrawEvents) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM live_draw_events WHERE raffle_id = $1")
            .bind(cmd.raffle_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
