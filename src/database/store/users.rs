use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::types::Json;
use uuid::Uuid;

use super::group_counts;
use crate::database::manager::DatabaseError;
use crate::database::models::{UserDraft, UserRow};
use crate::database::repository::Repository;
use crate::filter::FilterData;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: i64,
    pub by_role: BTreeMap<String, i64>,
    pub by_status: BTreeMap<String, i64>,
    pub recent_registrations: i64,
}

impl Repository<UserRow> {
    pub async fn insert(&self, draft: &UserDraft, password_hash: &str) -> Result<UserRow, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (first_name, last_name, email, password_hash, phone, role, department,
                                employee_id, student_id, profile, permissions, status, email_verified, preferences)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING *",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.email)
        .bind(password_hash)
        .bind(&draft.phone)
        .bind(draft.role.as_str())
        .bind(&draft.department)
        .bind(&draft.employee_id)
        .bind(&draft.student_id)
        .bind(Json(&draft.profile))
        .bind(Json(&draft.permissions))
        .bind(draft.status.as_str())
        .bind(draft.email_verified)
        .bind(Json(&draft.preferences))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Writes profile fields; email and password hash are left alone.
    pub async fn update(&self, id: Uuid, draft: &UserDraft) -> Result<Option<UserRow>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET
                first_name = $2, last_name = $3, phone = $4, role = $5, department = $6,
                employee_id = $7, student_id = $8, profile = $9, permissions = $10, status = $11,
                email_verified = $12, preferences = $13, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(&draft.phone)
        .bind(draft.role.as_str())
        .bind(&draft.department)
        .bind(&draft.employee_id)
        .bind(&draft.student_id)
        .bind(Json(&draft.profile))
        .bind(Json(&draft.permissions))
        .bind(draft.status.as_str())
        .bind(draft.email_verified)
        .bind(Json(&draft.preferences))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn stats(&self) -> Result<UserStats, DatabaseError> {
        let (total, by_role, by_status, recent_registrations) = tokio::try_join!(
            self.count(FilterData::default()),
            group_counts(&self.pool, "SELECT role, COUNT(*) FROM users GROUP BY role"),
            group_counts(&self.pool, "SELECT status, COUNT(*) FROM users GROUP BY status"),
            self.registered_since(Utc::now() - Duration::days(30)),
        )?;
        Ok(UserStats { total, by_role, by_status, recent_registrations })
    }

    pub async fn registered_since(&self, since: DateTime<Utc>) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
