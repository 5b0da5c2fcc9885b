use compact_str::CompactString;
use kanau::processor::Processor;
use rifas_sdk::objects::RaffleResponse;
use rust_decimal::Decimal;

use crate::entities::ticket::insert_codes;
use crate::entities::{RaffleState, RaffleVisibility, unix_seconds};
use crate::framework::{DatabaseProcessor, lock_raffle};
use crate::store::{Rejection, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Raffle {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Recorded capacity. Always equals the number of ticket rows of the raffle.
    pub ticket_count: i32,
    pub price: Decimal,
    pub prize_count: i32,
    pub visibility: RaffleVisibility,
    pub state: RaffleState,
    /// Code of the order-1 winner while that prize is drawn.
    pub winning_code: Option<CompactString>,
    pub image_url: Option<String>,
    pub created_at: time::PrimitiveDateTime,
}

impl Raffle {
    pub fn capacity(&self) -> u32 {
        self.ticket_count.unsigned_abs()
    }

    pub fn prizes(&self) -> u32 {
        self.prize_count.unsigned_abs()
    }
}

impl From<Raffle> for RaffleResponse {
    fn from(value: Raffle) -> Self {
        let ticket_count = value.capacity();
        let prize_count = value.prizes();
        RaffleResponse {
            id: value.id,
            title: value.title,
            description: value.description,
            ticket_count,
            price: value.price,
            prize_count,
            visibility: value.visibility.into(),
            state: value.state.into(),
            winning_code: value.winning_code,
            image_url: value.image_url,
            created_at: unix_seconds(value.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleInsert {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub prize_count: i32,
    pub visibility: RaffleVisibility,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
/// Insert a raffle together with one free ticket per code, atomically.
///
/// `ticket_count` is taken from `codes.len()`.
pub struct CreateRaffle {
    pub raffle: RaffleInsert,
    pub codes: Vec<CompactString>,
    pub batch_size: usize,
}

impl Processor<CreateRaffle> for DatabaseProcessor {
    type Output = Raffle;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:CreateRaffle")]
    async fn process(&self, cmd: CreateRaffle) -> Result<Raffle, StoreError> {
        let CreateRaffle {
            raffle,
            codes,
            batch_size,
        } = cmd;
        let ticket_count = i32::try_from(codes.len()).unwrap_or(i32::MAX);

        let mut tx = self.pool.begin().await?;
        let created = sqlx::query_as::<_, Raffle>(
            r#"
            INSERT INTO raffles
                (title, description, ticket_count, price, prize_count, visibility, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(raffle.title)
        .bind(raffle.description)
        .bind(ticket_count)
        .bind(raffle.price)
        .bind(raffle.prize_count)
        .bind(raffle.visibility)
        .bind(raffle.image_url)
        .fetch_one(&mut *tx)
        .await?;

        insert_codes(&mut tx, created.id, &codes, batch_size).await?;
        tx.commit().await?;
        Ok(created)
    }
}

#[derive(Debug, Clone)]
pub struct GetRaffleById {
    pub raffle_id: i64,
}

impl Processor<GetRaffleById> for DatabaseProcessor {
    type Output = Option<Raffle>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:GetRaffleById")]
    async fn process(&self, query: GetRaffleById) -> Result<Option<Raffle>, StoreError> {
        let raffle = sqlx::query_as::<_, Raffle>("SELECT * FROM raffles WHERE id = $1")
            .bind(query.raffle_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(raffle)
    }
}

/// List raffles newest first, optionally only those with the given visibility.
#[derive(Debug, Clone, Default)]
pub struct ListRaffles {
    pub visibility: Option<RaffleVisibility>,
}

impl Processor<ListRaffles> for DatabaseProcessor {
    type Output = Vec<Raffle>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRaffles")]
    async fn process(&self, query: ListRaffles) -> Result<Vec<Raffle>, StoreError> {
        let raffles = sqlx::query_as::<_, Raffle>(
            r#"
            SELECT * FROM raffles
            WHERE $1::raffle_visibility IS NULL OR visibility = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(query.visibility)
        .fetch_all(&self.pool)
        .await?;
        Ok(raffles)
    }
}

#[derive(Debug, Clone, Default)]
/// Overwrite the descriptive fields of a raffle. `None` leaves a field untouched.
///
/// When `require_state` is set the update only applies while the raffle is in
/// that state.
pub struct UpdateRaffleDetails {
    pub raffle_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub prize_count: Option<i32>,
    pub visibility: Option<RaffleVisibility>,
    pub image_url: Option<String>,
    pub require_state: Option<RaffleState>,
}

impl Processor<UpdateRaffleDetails> for DatabaseProcessor {
    type Output = Raffle;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateRaffleDetails")]
    async fn process(&self, cmd: UpdateRaffleDetails) -> Result<Raffle, StoreError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_raffle(&mut tx, cmd.raffle_id).await?;
        if cmd.require_state.is_some_and(|required| current.state != required) {
            return Err(Rejection::StateMismatch {
                raffle_id: cmd.raffle_id,
                actual: current.state,
            }
            .into());
        }

        let updated = sqlx::query_as::<_, Raffle>(
            r#"
            UPDATE raffles SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                prize_count = COALESCE($5, prize_count),
                visibility = COALESCE($6, visibility),
                image_url = COALESCE($7, image_url)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(cmd.raffle_id)
        .bind(cmd.title)
        .bind(cmd.description)
        .bind(cmd.price)
        .bind(cmd.prize_count)
        .bind(cmd.visibility)
        .bind(cmd.image_url)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }
}

#[derive(Debug, Clone)]
/// Delete a raffle. Tickets, winners and live events go with it through `ON DELETE CASCADE`.
///
/// Returns `false` when no raffle had that id.
pub struct DeleteRaffle {
    pub raffle_id: i64,
}

impl Processor<DeleteRaffle> for DatabaseProcessor {
    type Output = bool;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteRaffle")]
    async fn process(&self, cmd: DeleteRaffle) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM raffles WHERE id = $1")
            .bind(cmd.raffle_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rifas_sdk::objects::{RaffleState as SdkRaffleState, RaffleVisibility as SdkVisibility};

    #[test]
    fn test_response_carries_counts_and_owned_fields() {
        let created_at = crate::framework::now_utc();
        let raffle = Raffle {
            id: 7,
            title: "Canasta navideña".to_string(),
            description: Some("Tres premios".to_string()),
            ticket_count: 120,
            price: Decimal::new(2550, 2),
            prize_count: 3,
            visibility: RaffleVisibility::Hidden,
            state: RaffleState::InProgress,
            winning_code: Some(CompactString::from("042")),
            image_url: None,
            created_at,
        };
        let response = RaffleResponse::from(raffle);
        assert_eq!(response.id, 7);
        assert_eq!(response.title, "Canasta navideña");
        assert_eq!(response.description.as_deref(), Some("Tres premios"));
        assert_eq!(response.ticket_count, 120);
        assert_eq!(response.prize_count, 3);
        assert_eq!(response.price, Decimal::new(2550, 2));
        assert_eq!(response.visibility, SdkVisibility::Hidden);
        assert_eq!(response.state, SdkRaffleState::InProgress);
        assert_eq!(response.winning_code.as_deref(), Some("042"));
        assert_eq!(response.created_at, unix_seconds(created_at));
    }
}
