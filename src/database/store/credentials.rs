use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow};
use uuid::Uuid;

use crate::auth::{LockoutPolicy, ResetToken};
use crate::database::manager::DatabaseError;
use crate::database::models::{AdminRow, Table, UserRow};
use crate::database::repository::Repository;

/// A row that can sign in: users and admins share the lock-out and reset columns.
pub trait Account: Table {
    fn id(&self) -> Uuid;
    fn password_hash(&self) -> &str;
    fn lock_until(&self) -> Option<DateTime<Utc>>;
}

impl Account for UserRow {
    fn id(&self) -> Uuid {
        self.id
    }
    fn password_hash(&self) -> &str {
        &self.password_hash
    }
    fn lock_until(&self) -> Option<DateTime<Utc>> {
        self.lock_until
    }
}

impl Account for AdminRow {
    fn id(&self) -> Uuid {
        self.id
    }
    fn password_hash(&self) -> &str {
        &self.password_hash
    }
    fn lock_until(&self) -> Option<DateTime<Utc>> {
        self.lock_until
    }
}

impl<T> Repository<T>
where
    T: Account + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub async fn select_by_email(&self, email: &str) -> Result<Option<T>, DatabaseError> {
        self.select_by("email", &email.trim().to_lowercase()).await
    }

    /// Bumps the failure counter in one statement, locking the account once
    /// the threshold is reached. An expired lock restarts the count at one.
    /// Returns the stored counter and lock expiry.
    pub async fn record_failed_login(
        &self,
        id: Uuid,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<(i32, Option<DateTime<Utc>>), DatabaseError> {
        let sql = format!(
            "UPDATE \"{}\" SET
                 login_attempts = CASE WHEN lock_until IS NOT NULL AND lock_until <= $2 THEN 1
                                       ELSE login_attempts + 1 END,
                 lock_until = CASE WHEN lock_until IS NOT NULL AND lock_until <= $2 THEN NULL
                                   WHEN lock_until IS NULL AND login_attempts + 1 >= $3 THEN $4
                                   ELSE lock_until END
             WHERE id = $1
             RETURNING login_attempts, lock_until",
            T::TABLE
        );
        let row = sqlx::query_as::<_, (i32, Option<DateTime<Utc>>)>(&sql)
            .bind(id)
            .bind(now)
            .bind(policy.max_attempts)
            .bind(policy.lock_expiry(now))
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| DatabaseError::NotFound("Account not found".to_string()))
    }

    /// Clears the lock-out counters and stamps `last_login`.
    pub async fn record_login(&self, id: Uuid) -> Result<T, DatabaseError> {
        let sql = format!(
            "UPDATE \"{}\" SET login_attempts = 0, lock_until = NULL, last_login = now() WHERE id = $1 RETURNING *",
            T::TABLE
        );
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(row)
    }

    pub async fn store_reset_token(&self, id: Uuid, token: &ResetToken) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE \"{}\" SET password_reset_token = $2, password_reset_expires = $3 WHERE id = $1",
            T::TABLE
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(&token.digest)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Account holding an unexpired reset token with this digest.
    pub async fn select_by_reset_token(&self, digest: &str, now: DateTime<Utc>) -> Result<Option<T>, DatabaseError> {
        let sql = format!(
            "SELECT * FROM \"{}\" WHERE password_reset_token = $1 AND password_reset_expires > $2 LIMIT 1",
            T::TABLE
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(digest)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Stores a new hash and drops any pending reset token or lock.
    pub async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE \"{}\" SET password_hash = $2, password_reset_token = NULL, password_reset_expires = NULL,
                              login_attempts = 0, lock_until = NULL, updated_at = now()
             WHERE id = $1",
            T::TABLE
        );
        let result = sqlx::query(&sql).bind(id).bind(password_hash).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Account not found".to_string()));
        }
        Ok(())
    }
}
