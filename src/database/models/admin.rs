use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{allowed_values, Table};
use crate::error::ApiError;
use crate::validation::Validator;

text_enum! {
    pub enum AdminStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub password_hash: String,
    pub status: AdminStatus,
    pub admin_alerts: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for AdminRow {
    const TABLE: &'static str = "admins";
}

impl AdminRow {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub status: AdminStatus,
    pub admin_alerts: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            department: row.department,
            status: row.status,
            admin_alerts: row.admin_alerts,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub password: Option<String>,
    pub status: Option<String>,
    pub admin_alerts: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub password: Option<String>,
    pub status: AdminStatus,
    pub admin_alerts: bool,
}

impl AdminDraft {
    pub fn register(input: AdminInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        match input.password.as_deref() {
            Some(password) => v.password("password", password),
            None => v.error("password", "Password is required"),
        }
        let draft = Self {
            first_name: input.first_name.unwrap_or_default().trim().to_string(),
            last_name: input.last_name.unwrap_or_default().trim().to_string(),
            email: input.email.unwrap_or_default().trim().to_lowercase(),
            phone: input.phone.and_then(non_empty),
            department: input.department.and_then(non_empty),
            password: input.password,
            status: AdminStatus::Active,
            admin_alerts: input.admin_alerts.unwrap_or(true),
        };
        draft.finish(v)
    }

    /// Partial update; the email address cannot be changed here.
    pub fn update(row: &AdminRow, input: AdminInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        let mut draft = Self {
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            email: row.email.clone(),
            phone: row.phone.clone(),
            department: row.department.clone(),
            password: None,
            status: row.status,
            admin_alerts: row.admin_alerts,
        };
        if let Some(first) = input.first_name {
            draft.first_name = first.trim().to_string();
        }
        if let Some(last) = input.last_name {
            draft.last_name = last.trim().to_string();
        }
        if let Some(phone) = input.phone {
            draft.phone = non_empty(phone);
        }
        if let Some(department) = input.department {
            draft.department = non_empty(department);
        }
        if let Some(raw) = input.status {
            match raw.trim().to_lowercase().parse::<AdminStatus>() {
                Ok(status) => draft.status = status,
                Err(_) => v.error("status", format!("Invalid status. Allowed: {}", allowed_values(AdminStatus::ALL))),
            }
        }
        if let Some(alerts) = input.admin_alerts {
            draft.admin_alerts = alerts;
        }
        draft.finish(v)
    }

    fn finish(self, mut v: Validator) -> Result<Self, ApiError> {
        v.text("firstName", &self.first_name, 1, 50);
        v.text("lastName", &self.last_name, 1, 50);
        v.email("email", &self.email);
        v.phone("phone", self.phone.as_deref());
        v.max_len("department", self.department.as_deref(), 100);
        v.finish()?;
        Ok(self)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> AdminRow {
        let now = Utc::now();
        AdminRow {
            id: Uuid::new_v4(),
            first_name: "Lindiwe".into(),
            last_name: "Nkosi".into(),
            email: "lindiwe@ump.ac.za".into(),
            phone: None,
            department: Some("Facilities".into()),
            password_hash: "hash".into(),
            status: AdminStatus::Active,
            admin_alerts: true,
            last_login: None,
            login_attempts: 0,
            lock_until: None,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn register_lowercases_email_and_requires_strong_password() {
        let input: AdminInput = serde_json::from_value(json!({
            "firstName": "Sipho",
            "lastName": "Dlamini",
            "email": "Sipho@UMP.ac.za",
            "password": "Campus#2024"
        }))
        .unwrap();
        let draft = AdminDraft::register(input).unwrap();
        assert_eq!(draft.email, "sipho@ump.ac.za");
        assert!(draft.admin_alerts);

        let weak: AdminInput = serde_json::from_value(json!({
            "firstName": "Sipho",
            "lastName": "Dlamini",
            "email": "sipho@ump.ac.za",
            "password": "weak"
        }))
        .unwrap();
        assert!(AdminDraft::register(weak).is_err());
    }

    #[test]
    fn update_ignores_email() {
        let input: AdminInput = serde_json::from_value(json!({
            "email": "someone.else@ump.ac.za",
            "department": "  ",
            "adminAlerts": false
        }))
        .unwrap();
        let draft = AdminDraft::update(&row(), input).unwrap();
        assert_eq!(draft.email, "lindiwe@ump.ac.za");
        assert_eq!(draft.department, None);
        assert!(!draft.admin_alerts);
    }

    #[test]
    fn locked_until_in_future() {
        let mut admin = row();
        let now = Utc::now();
        assert!(!admin.is_locked(now));
        admin.lock_until = Some(now + chrono::Duration::minutes(5));
        assert!(admin.is_locked(now));
    }
}
