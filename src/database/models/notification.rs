use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Table;

text_enum! {
    pub enum NotificationType {
        NewBuilding => "new-building",
        SettingsChanged => "settings-changed",
        NewPath => "new-path",
        General => "general",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub recipient: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Table for Notification {
    const TABLE: &'static str = "notifications";
}

/// Message fanned out to every admin with alerts enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
}

impl Announcement {
    pub fn new_building(name: &str, code: &str) -> Self {
        Self {
            title: "New building added".to_string(),
            message: format!("Building {} ({}) was added to the campus map", name, code),
            kind: NotificationType::NewBuilding,
        }
    }

    pub fn new_path(name: &str, campus: &str) -> Self {
        Self {
            title: "New path added".to_string(),
            message: format!("Path {} was added on {}", name, campus),
            kind: NotificationType::NewPath,
        }
    }
}
