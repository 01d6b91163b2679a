use serde_json::json;
use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Table;
use crate::database::query_builder::QueryBuilder;
use crate::filter::FilterData;

/// Table-scoped access for one row type.
///
/// Generic reads go through the JSON filter; writes and aggregates live in
/// per-table `impl Repository<Row>` blocks next to this module.
pub struct Repository<T> {
    pub(crate) pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: Table + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(T::TABLE)
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    pub async fn select_one(&self, filter_data: FilterData) -> Result<Option<T>, DatabaseError> {
        QueryBuilder::<T>::new(T::TABLE)
            .filter(filter_data)?
            .select_optional(&self.pool)
            .await
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(T::TABLE)
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    /// One page of rows plus the total matching the same WHERE clause.
    pub async fn select_page(&self, filter_data: FilterData) -> Result<(Vec<T>, i64), DatabaseError> {
        let count_filter = FilterData {
            where_clause: filter_data.where_clause.clone(),
            ..Default::default()
        };
        let (rows, total) = tokio::try_join!(self.select_any(filter_data), self.count(count_filter))?;
        Ok((rows, total))
    }

    pub async fn select_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM \"{}\" WHERE id = $1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    pub async fn select_404(&self, id: Uuid, what: &str) -> Result<T, DatabaseError> {
        self.select_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", what)))
    }

    /// Deletes by id and returns the removed row.
    pub async fn delete_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1 RETURNING *", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    /// Equality lookup on a single column, e.g. `email`.
    pub async fn select_by(&self, column: &str, value: &str) -> Result<Option<T>, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(json!({ column: value })),
            limit: Some(1),
            ..Default::default()
        };
        self.select_one(filter).await
    }
}
