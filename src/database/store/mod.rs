//! Per-table writes, geo lookups and aggregates on top of [`Repository`].
//!
//! [`Repository`]: crate::database::repository::Repository

pub mod admins;
pub mod buildings;
pub mod credentials;
pub mod notifications;
pub mod paths;
pub mod users;

use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::database::manager::DatabaseError;

/// Runs a `SELECT key, COUNT(*)` style query into an ordered map.
pub(crate) async fn group_counts(pool: &PgPool, sql: &str) -> Result<BTreeMap<String, i64>, DatabaseError> {
    let rows = sqlx::query_as::<_, (Option<String>, i64)>(sql).fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(key, count)| (key.unwrap_or_else(|| "unknown".to_string()), count))
        .collect())
}
