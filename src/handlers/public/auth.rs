// handlers/public/auth.rs - Sign-in, registration and password reset
//
// Admin and portal-user sign-in share one credential check: unknown email,
// ineligible account and wrong password all answer 401 with the same
// message; a locked account answers 423.

use axum::extract::{Extension, Path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow};

use crate::app::AppState;
use crate::auth::{digest_reset_token, generate_jwt, hash_password, verify_password, Claims, LockoutPolicy, ResetToken};
use crate::config;
use crate::database::models::{Admin, AdminDraft, AdminInput, AdminRow, AdminStatus, Role, User, UserRow, UserStatus};
use crate::database::{Account, Repository};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::validation::Validator;

const ADMIN_REJECTION: &str = "Invalid credentials";
const USER_REJECTION: &str = "Invalid credentials. Access restricted to authorized administrators only.";
const LOCKED: &str = "Account temporarily locked due to too many failed login attempts. Please try again later.";

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    fn credentials(self) -> Result<(String, String), ApiError> {
        let mut v = Validator::new();
        let email = self.email.unwrap_or_default().trim().to_lowercase();
        let password = self.password.unwrap_or_default();
        v.email("email", &email);
        v.check(!password.is_empty(), "password", "Password is required");
        v.finish()?;
        Ok((email, password))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminSession {
    pub admin: Admin,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserSession {
    pub user: User,
    pub token: String,
}

/// Checks a password against an account, applying the lock-out policy.
///
/// `eligible` filters accounts that may not sign in at all; they are rejected
/// before the password is checked and do not count as failures.
async fn authenticate<T, F>(
    repo: &Repository<T>,
    email: &str,
    password: &str,
    rejection: &str,
    eligible: F,
) -> Result<T, ApiError>
where
    T: Account + for<'r> FromRow<'r, PgRow> + Send + Unpin,
    F: Fn(&T) -> bool,
{
    let now = Utc::now();
    let account = match repo.select_by_email(email).await? {
        Some(account) if eligible(&account) => account,
        _ => {
            tracing::warn!("Sign-in rejected for {}: no eligible account", email);
            return Err(ApiError::unauthorized(rejection));
        }
    };

    if is_locked(account.lock_until(), now) {
        tracing::warn!("Sign-in rejected for {}: account locked", email);
        return Err(ApiError::locked(LOCKED));
    }

    if !verify_password(password, account.password_hash()) {
        let (attempts, lock) = repo.record_failed_login(account.id(), &LockoutPolicy::from_config(), now).await?;
        tracing::warn!("Sign-in rejected for {}: wrong password ({} failures)", email, attempts);
        return match lock {
            Some(until) if until > now => Err(ApiError::locked(LOCKED)),
            _ => Err(ApiError::unauthorized(rejection)),
        };
    }

    Ok(repo.record_login(account.id()).await?)
}

fn is_locked(lock_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    lock_until.is_some_and(|until| until > now)
}

/// POST /api/admins/register - create an administrator and sign them in
pub async fn admin_register(
    Extension(state): Extension<AppState>,
    ApiJson(input): ApiJson<AdminInput>,
) -> ApiResult<AdminSession> {
    if !config::config().security.allow_admin_registration {
        return Err(ApiError::forbidden("Administrator registration is disabled"));
    }

    let draft = AdminDraft::register(input)?;
    let repo = Repository::<AdminRow>::new(state.db.pool().clone());
    if repo.select_by_email(&draft.email).await?.is_some() {
        return Err(ApiError::conflict("An administrator with that email already exists"));
    }

    let password = draft.password.as_deref().unwrap_or_default();
    let password_hash = hash_password(password)?;
    let row = repo.insert(&draft, &password_hash).await?;
    let token = generate_jwt(&Claims::for_admin(row.id))?;

    tracing::info!("Registered administrator {} ({})", row.email, row.id);
    Ok(ApiResponse::created(AdminSession { admin: Admin::from(row), token })
        .message("Administrator registered successfully"))
}

/// POST /api/admins/login
pub async fn admin_login(
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<AdminSession> {
    let (email, password) = request.credentials()?;
    let repo = Repository::<AdminRow>::new(state.db.pool().clone());
    let row = authenticate(&repo, &email, &password, ADMIN_REJECTION, |admin: &AdminRow| {
        admin.status == AdminStatus::Active
    })
    .await?;

    let token = generate_jwt(&Claims::for_admin(row.id))?;
    tracing::info!("Administrator {} signed in", row.email);
    Ok(ApiResponse::success(AdminSession { admin: Admin::from(row), token }).message("Login successful"))
}

/// POST /api/users/login - portal sign-in, limited to active users with the admin role
pub async fn user_login(
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<UserSession> {
    let (email, password) = request.credentials()?;
    let repo = Repository::<UserRow>::new(state.db.pool().clone());
    let row = authenticate(&repo, &email, &password, USER_REJECTION, |user: &UserRow| {
        user.role == Role::Admin && user.status == UserStatus::Active
    })
    .await?;

    let token = generate_jwt(&Claims::for_user(row.id, row.role))?;
    tracing::info!("User {} signed in", row.email);
    Ok(ApiResponse::success(UserSession { user: User::from(row), token }).message("Login successful"))
}

/// POST /api/admins/forgot-password - issue a reset token
///
/// Always answers 200 so the response does not reveal which emails exist.
/// The reset link is logged; nothing is mailed.
pub async fn forgot_password(
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<()> {
    let email = request.email.unwrap_or_default().trim().to_lowercase();
    let mut v = Validator::new();
    v.email("email", &email);
    v.finish()?;

    let repo = Repository::<AdminRow>::new(state.db.pool().clone());
    if let Some(admin) = repo.select_by_email(&email).await? {
        let token = ResetToken::generate(Utc::now());
        repo.store_reset_token(admin.id, &token).await?;
        tracing::info!(
            "Password reset requested for {}: {} (expires {})",
            admin.email,
            token.link(&config::config().security.client_url),
            token.expires_at
        );
    } else {
        tracing::warn!("Password reset requested for unknown email {}", email);
    }

    Ok(ApiResponse::success(()).message("If that email is registered, a password reset link has been issued"))
}

/// POST /api/admins/reset-password/:token
pub async fn reset_password(
    Extension(state): Extension<AppState>,
    Path(token): Path<String>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    let password = request.password.unwrap_or_default();
    let mut v = Validator::new();
    v.password("password", &password);
    v.finish()?;

    let repo = Repository::<AdminRow>::new(state.db.pool().clone());
    let admin = repo
        .select_by_reset_token(&digest_reset_token(token.trim()), Utc::now())
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid or expired reset token"))?;

    repo.set_password(admin.id, &hash_password(&password)?).await?;
    tracing::info!("Password reset completed for {}", admin.email);
    Ok(ApiResponse::success(()).message("Password has been reset successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn login_requires_email_and_password() {
        let err = LoginRequest { email: Some("not-an-email".into()), password: None }
            .credentials()
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let (email, _) = LoginRequest {
            email: Some(" Admin@Campus.EDU ".into()),
            password: Some("secret".into()),
        }
        .credentials()
        .unwrap();
        assert_eq!(email, "admin@campus.edu");
    }

    #[test]
    fn lock_expires() {
        let now = Utc::now();
        assert!(is_locked(Some(now + Duration::minutes(5)), now));
        assert!(!is_locked(Some(now - Duration::minutes(5)), now));
        assert!(!is_locked(None, now));
    }
}
