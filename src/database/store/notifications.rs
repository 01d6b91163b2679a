use futures::future::try_join_all;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Announcement, Notification};
use crate::database::repository::Repository;

impl Repository<Notification> {
    /// One notification per recipient, inserted concurrently.
    pub async fn announce(&self, recipients: &[Uuid], announcement: &Announcement) -> Result<usize, DatabaseError> {
        let inserts = recipients.iter().map(|recipient| {
            sqlx::query("INSERT INTO notifications (title, message, kind, recipient) VALUES ($1, $2, $3, $4)")
                .bind(&announcement.title)
                .bind(&announcement.message)
                .bind(announcement.kind.as_str())
                .bind(*recipient)
                .execute(&self.pool)
        });
        let done = try_join_all(inserts).await?;
        Ok(done.len())
    }

    pub async fn latest_for(&self, recipient: Uuid, limit: i64) -> Result<Vec<Notification>, DatabaseError> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE recipient = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(recipient)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn unread_count(&self, recipient: Uuid) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE recipient = $1 AND NOT read")
            .bind(recipient)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// None when the notification does not exist or belongs to someone else.
    pub async fn mark_read(&self, id: Uuid, recipient: Uuid) -> Result<Option<Notification>, DatabaseError> {
        let row = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient = $2 RETURNING *",
        )
        .bind(id)
        .bind(recipient)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn mark_all_read(&self, recipient: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE recipient = $1 AND NOT read")
            .bind(recipient)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
