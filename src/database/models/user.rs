use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use super::{allowed_values, Table};
use crate::error::ApiError;
use crate::validation::Validator;

text_enum! {
    pub enum Role {
        Admin => "admin",
        Manager => "manager",
        Staff => "staff",
        Student => "student",
    }
}

text_enum! {
    pub enum UserStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
        Pending => "pending",
    }
}

text_enum! {
    pub enum Theme {
        Light => "light",
        Dark => "dark",
        Auto => "auto",
    }
}

text_enum! {
    pub enum Language {
        English => "en",
        Afrikaans => "af",
        Zulu => "zu",
        Xhosa => "xh",
    }
}

/// A single capability checked by route guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    BuildingsRead,
    BuildingsWrite,
    BuildingsDelete,
    UsersRead,
    UsersWrite,
    UsersDelete,
    DashboardRead,
    DashboardAnalytics,
    PathsRead,
    PathsWrite,
    PathsDelete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceAccess {
    pub read: bool,
    pub write: bool,
    pub delete: bool,
}

impl ResourceAccess {
    const fn new(read: bool, write: bool, delete: bool) -> Self {
        Self { read, write, delete }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardAccess {
    pub read: bool,
    pub analytics: bool,
}

/// Permission flags, always derived from the role on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub buildings: ResourceAccess,
    pub users: ResourceAccess,
    pub dashboard: DashboardAccess,
    pub paths: ResourceAccess,
}

impl Permissions {
    pub const fn all() -> Self {
        Self {
            buildings: ResourceAccess::new(true, true, true),
            users: ResourceAccess::new(true, true, true),
            dashboard: DashboardAccess { read: true, analytics: true },
            paths: ResourceAccess::new(true, true, true),
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::all(),
            Role::Manager => Self {
                buildings: ResourceAccess::new(true, true, false),
                users: ResourceAccess::new(true, false, false),
                dashboard: DashboardAccess { read: true, analytics: true },
                paths: ResourceAccess::new(true, true, false),
            },
            Role::Staff => Self {
                buildings: ResourceAccess::new(true, false, false),
                users: ResourceAccess::default(),
                dashboard: DashboardAccess { read: true, analytics: false },
                paths: ResourceAccess::new(true, false, false),
            },
            Role::Student => Self {
                buildings: ResourceAccess::new(true, false, false),
                users: ResourceAccess::default(),
                dashboard: DashboardAccess::default(),
                paths: ResourceAccess::new(true, false, false),
            },
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::BuildingsRead => self.buildings.read,
            Permission::BuildingsWrite => self.buildings.write,
            Permission::BuildingsDelete => self.buildings.delete,
            Permission::UsersRead => self.users.read,
            Permission::UsersWrite => self.users.write,
            Permission::UsersDelete => self.users.delete,
            Permission::DashboardRead => self.dashboard.read,
            Permission::DashboardAnalytics => self.dashboard.analytics,
            Permission::PathsRead => self.paths.read,
            Permission::PathsWrite => self.paths.write,
            Permission::PathsDelete => self.paths.delete,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Address,
    pub emergency_contact: EmergencyContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationChannels {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
}

impl Default for NotificationChannels {
    fn default() -> Self {
        Self { email: true, push: true, sms: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub language: Language,
    pub notifications: NotificationChannels,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: Language::English,
            notifications: NotificationChannels::default(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub profile: Json<Profile>,
    pub permissions: Json<Permissions>,
    pub status: UserStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub email_verified: bool,
    pub preferences: Json<Preferences>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Table for UserRow {
    const TABLE: &'static str = "users";
}

impl UserRow {
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lock_until.is_some_and(|until| until > now)
    }
}

/// User as returned by the API; credentials and reset tokens are never exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub profile: Profile,
    pub permissions: Permissions,
    pub status: UserStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub is_locked: bool,
    pub email_verified: bool,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let is_locked = row.is_locked(Utc::now());
        Self {
            id: row.id,
            full_name: format!("{} {}", row.first_name, row.last_name),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            role: row.role,
            department: row.department,
            employee_id: row.employee_id,
            student_id: row.student_id,
            profile: row.profile.0,
            permissions: row.permissions.0,
            status: row.status,
            last_login: row.last_login,
            is_locked,
            email_verified: row.email_verified,
            preferences: row.preferences.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body accepted when creating or updating a user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub status: Option<String>,
    pub email_verified: Option<bool>,
    pub profile: Option<Profile>,
    pub preferences: Option<Preferences>,
}

impl UserInput {
    /// Keeps only the fields a user may change on their own profile.
    pub fn self_service(self) -> Self {
        Self {
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            department: self.department,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub employee_id: Option<String>,
    pub student_id: Option<String>,
    pub status: UserStatus,
    pub email_verified: bool,
    pub profile: Profile,
    pub permissions: Permissions,
    pub preferences: Preferences,
}

impl UserDraft {
    pub fn create(input: UserInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        v.check(input.email.is_some(), "email", "Please provide a valid email");
        match input.password.as_deref() {
            Some(password) => v.password("password", password),
            None => v.error("password", "Password is required"),
        }

        let mut draft = Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: None,
            phone: None,
            role: Role::Staff,
            department: None,
            employee_id: None,
            student_id: None,
            status: UserStatus::Active,
            email_verified: false,
            profile: Profile::default(),
            permissions: Permissions::default(),
            preferences: Preferences::default(),
        };
        draft.password = input.password.clone();
        if let Some(email) = input.email.as_deref() {
            draft.email = email.trim().to_lowercase();
        }
        draft.merge(input, &mut v);
        draft.finish(v)
    }

    /// Applies an update; email and password are changed through their own flows.
    pub fn update(row: &UserRow, input: UserInput) -> Result<Self, ApiError> {
        let mut v = Validator::new();
        let mut draft = Self {
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            email: row.email.clone(),
            password: None,
            phone: row.phone.clone(),
            role: row.role,
            department: row.department.clone(),
            employee_id: row.employee_id.clone(),
            student_id: row.student_id.clone(),
            status: row.status,
            email_verified: row.email_verified,
            profile: row.profile.0.clone(),
            permissions: row.permissions.0,
            preferences: row.preferences.0,
        };
        draft.merge(input, &mut v);
        draft.finish(v)
    }

    fn merge(&mut self, input: UserInput, v: &mut Validator) {
        if let Some(first) = input.first_name {
            self.first_name = first.trim().to_string();
        }
        if let Some(last) = input.last_name {
            self.last_name = last.trim().to_string();
        }
        if let Some(phone) = input.phone {
            self.phone = non_empty(phone);
        }
        if let Some(raw) = input.role {
            match raw.trim().to_lowercase().parse::<Role>() {
                Ok(role) => self.role = role,
                Err(_) => v.error("role", format!("Invalid role. Allowed: {}", allowed_values(Role::ALL))),
            }
        }
        if let Some(department) = input.department {
            self.department = non_empty(department);
        }
        if let Some(id) = input.employee_id {
            self.employee_id = non_empty(id);
        }
        if let Some(id) = input.student_id {
            self.student_id = non_empty(id);
        }
        if let Some(raw) = input.status {
            match raw.trim().to_lowercase().parse::<UserStatus>() {
                Ok(status) => self.status = status,
                Err(_) => v.error("status", format!("Invalid status. Allowed: {}", allowed_values(UserStatus::ALL))),
            }
        }
        if let Some(verified) = input.email_verified {
            self.email_verified = verified;
        }
        if let Some(profile) = input.profile {
            self.profile = profile;
        }
        if let Some(preferences) = input.preferences {
            self.preferences = preferences;
        }
    }

    fn finish(mut self, mut v: Validator) -> Result<Self, ApiError> {
        v.text("firstName", &self.first_name, 1, 50);
        v.text("lastName", &self.last_name, 1, 50);
        v.email("email", &self.email);
        v.phone("phone", self.phone.as_deref());
        v.max_len("department", self.department.as_deref(), 100);
        v.max_len("employeeId", self.employee_id.as_deref(), 20);
        v.max_len("studentId", self.student_id.as_deref(), 20);
        v.max_len("profile.bio", self.profile.bio.as_deref(), 500);
        v.finish()?;

        if self.profile.address.country.is_none() {
            self.profile.address.country = Some("South Africa".to_string());
        }
        self.permissions = Permissions::for_role(self.role);
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

    fn input(value: serde_json::Value) -> UserInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn role_permission_matrix() {
        let manager = Permissions::for_role(Role::Manager);
        assert!(manager.allows(Permission::BuildingsWrite));
        assert!(!manager.allows(Permission::BuildingsDelete));
        assert!(manager.allows(Permission::UsersRead));
        assert!(!manager.allows(Permission::UsersWrite));
        assert!(manager.allows(Permission::DashboardAnalytics));
        assert!(manager.allows(Permission::PathsWrite));

        let staff = Permissions::for_role(Role::Staff);
        assert!(staff.allows(Permission::DashboardRead));
        assert!(!staff.allows(Permission::DashboardAnalytics));
        assert!(!staff.allows(Permission::PathsWrite));

        let student = Permissions::for_role(Role::Student);
        assert!(student.allows(Permission::BuildingsRead));
        assert!(student.allows(Permission::PathsRead));
        assert!(!student.allows(Permission::DashboardRead));

        assert_eq!(Permissions::for_role(Role::Admin), Permissions::all());
    }

    #[test]
    fn create_normalizes_and_derives_permissions() {
        let draft = UserDraft::create(input(json!({
            "firstName": " Thandi ",
            "lastName": "Mokoena",
            "email": " Thandi.Mokoena@UMP.ac.za ",
            "password": "Campus#2024",
            "role": "Manager"
        })))
        .unwrap();

        assert_eq!(draft.first_name, "Thandi");
        assert_eq!(draft.email, "thandi.mokoena@ump.ac.za");
        assert_eq!(draft.role, Role::Manager);
        assert_eq!(draft.permissions, Permissions::for_role(Role::Manager));
        assert_eq!(draft.profile.address.country.as_deref(), Some("South Africa"));
        assert_eq!(draft.preferences, Preferences::default());
    }

    #[test]
    fn create_rejects_weak_password_and_unknown_role() {
        let err = UserDraft::create(input(json!({
            "firstName": "A",
            "lastName": "B",
            "email": "a@b.co",
            "password": "password",
            "role": "janitor"
        })))
        .unwrap_err();

        match err {
            ApiError::ValidationError { field_errors: Some(errors), .. } => {
                assert!(errors.contains_key("password"));
                assert!(errors.contains_key("role"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn self_service_drops_privileged_fields() {
        let filtered = input(json!({
            "firstName": "New",
            "role": "admin",
            "status": "active",
            "email": "other@example.com"
        }))
        .self_service();
        assert_eq!(filtered.first_name.as_deref(), Some("New"));
        assert!(filtered.role.is_none());
        assert!(filtered.status.is_none());
        assert!(filtered.email.is_none());
    }
}
