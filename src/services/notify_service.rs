use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{AdminRow, Announcement, Notification};
use crate::database::Repository;

/// Fans announcements out to every active admin with alerts enabled.
pub struct NotifyService {
    pool: PgPool,
}

impl NotifyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn deliver(&self, announcement: &Announcement) -> Result<usize, DatabaseError> {
        let recipients = Repository::<AdminRow>::new(self.pool.clone()).alert_recipients().await?;
        if recipients.is_empty() {
            return Ok(0);
        }
        Repository::<Notification>::new(self.pool.clone())
            .announce(&recipients, announcement)
            .await
    }

    /// Failures are logged, never returned to the caller.
    pub async fn announce(&self, announcement: &Announcement) {
        match self.deliver(announcement).await {
            Ok(sent) => tracing::debug!("Sent '{}' to {} admins", announcement.title, sent),
            Err(e) => tracing::error!("Failed to send '{}' notifications: {}", announcement.title, e),
        }
    }
}
