use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{AdminDraft, AdminRow, AdminStatus};
use crate::database::repository::Repository;

impl Repository<AdminRow> {
    pub async fn insert(&self, draft: &AdminDraft, password_hash: &str) -> Result<AdminRow, DatabaseError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "INSERT INTO admins (first_name, last_name, email, phone, department, password_hash, status, admin_alerts)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email)
        .bind(&draft.phone)
        .bind(&draft.department)
        .bind(password_hash)
        .bind(draft.status.as_str())
        .bind(draft.admin_alerts)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: Uuid, draft: &AdminDraft) -> Result<Option<AdminRow>, DatabaseError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "UPDATE admins SET
                first_name = $2, last_name = $3, phone = $4, department = $5,
                status = $6, admin_alerts = $7, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.phone)
        .bind(&draft.department)
        .bind(draft.status.as_str())
        .bind(draft.admin_alerts)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Active admins who opted into alerts.
    pub async fn alert_recipients(&self) -> Result<Vec<Uuid>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM admins WHERE admin_alerts AND status = $1")
            .bind(AdminStatus::Active.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
