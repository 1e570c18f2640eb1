use crate::errors::ServiceError;
use crate::models::sizes;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use tracing::instrument;

/// Issues the next ISO serial for a size with a single atomic statement.
/// Two concurrent callers can never observe the same value: the increment
/// and the read happen in one `UPDATE .. RETURNING`, so the row lock on the
/// counter serialises them.
#[instrument(skip(conn))]
pub async fn next_iso_number<C: ConnectionTrait>(conn: &C, size: i32) -> Result<i64, ServiceError> {
    if !sizes::is_supported(size) {
        return Err(ServiceError::InvalidInput(format!(
            "unsupported size {}",
            size
        )));
    }

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "UPDATE iso_counters SET last_value = last_value + 1 WHERE size = $1 RETURNING last_value",
        [size.into()],
    );
    let row = conn
        .query_one(stmt)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no counter row for size {}", size)))?;
    let value: i64 = row.try_get("", "last_value")?;
    Ok(value)
}

/// Issues the next global pallet number from the singleton counter row.
#[instrument(skip(conn))]
pub async fn next_pallet_number<C: ConnectionTrait>(conn: &C) -> Result<i64, ServiceError> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        "UPDATE pallet_counters SET last_value = last_value + 1 WHERE id = $1 RETURNING last_value",
        [1i32.into()],
    );
    let row = conn
        .query_one(stmt)
        .await?
        .ok_or_else(|| ServiceError::NotFound("pallet counter row missing".to_string()))?;
    let value: i64 = row.try_get("", "last_value")?;
    Ok(value)
}
