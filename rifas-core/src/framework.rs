use crate::entities::raffle::Raffle;
use crate::store::{Rejection, StoreError};
use sqlx::PgPool;

/// Postgres-backed store. Every command is a `kanau` processor over this type.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}

/// Current UTC time without offset, matching the `TIMESTAMP` columns.
pub fn now_utc() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}

/// Lock a raffle row for the rest of the transaction.
///
/// Every mutating command calls this first, which serializes writers per raffle.
pub(crate) async fn lock_raffle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    raffle_id: i64,
) -> Result<Raffle, StoreError> {
    sqlx::query_as::<_, Raffle>("SELECT * FROM raffles WHERE id = $1 FOR UPDATE")
        .bind(raffle_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::Rejected(Rejection::RaffleNotFound(raffle_id)))
}
