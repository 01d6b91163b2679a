// handlers/protected/admins.rs - Administrator accounts (administrator tokens only)

use axum::extract::{Extension, Path};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::auth::{hash_password, verify_password};
use crate::database::models::{Admin, AdminDraft, AdminInput, AdminRow};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthPrincipal};
use crate::validation::Validator;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

fn repo(state: &AppState) -> Repository<AdminRow> {
    Repository::new(state.db.pool().clone())
}

fn missing() -> ApiError {
    ApiError::not_found("Administrator not found")
}

/// GET /api/admins - newest first
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
) -> ApiResult<Vec<Admin>> {
    principal.require_admin()?;
    let rows = repo(&state)
        .select_any(FilterData {
            order: Some(json!({ "created_at": "desc" })),
            ..Default::default()
        })
        .await?;
    let admins: Vec<Admin> = rows.into_iter().map(Admin::from).collect();
    let count = admins.len();
    Ok(ApiResponse::success(admins).count(count))
}

/// GET /api/admins/:id
pub async fn show(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<Admin> {
    principal.require_admin()?;
    let id = parse_id(&id, "administrator")?;
    let row = repo(&state).select_id(id).await?.ok_or_else(missing)?;
    Ok(ApiResponse::success(Admin::from(row)))
}

/// PUT /api/admins/:id - profile fields, status and alert preference; email is immutable
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<AdminInput>,
) -> ApiResult<Admin> {
    principal.require_admin()?;
    let id = parse_id(&id, "administrator")?;
    let repo = repo(&state);
    let current = repo.select_id(id).await?.ok_or_else(missing)?;
    let draft = AdminDraft::update(&current, input)?;
    let row = repo.update(id, &draft).await?.ok_or_else(missing)?;

    tracing::info!("{} updated administrator {}", principal.email, row.email);
    Ok(ApiResponse::success(Admin::from(row)).message("Administrator updated successfully"))
}

/// DELETE /api/admins/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    principal.require_admin()?;
    let id = parse_id(&id, "administrator")?;
    if id == principal.id {
        return Err(ApiError::bad_request("You cannot remove your own account"));
    }
    let row = repo(&state).delete_id(id).await?.ok_or_else(missing)?;

    tracing::info!("{} removed administrator {}", principal.email, row.email);
    Ok(ApiResponse::success(()).message("Administrator removed successfully"))
}

/// PUT /api/admins/:id/password - requires the current password
pub async fn change_password(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PasswordChange>,
) -> ApiResult<()> {
    principal.require_admin()?;
    let id = parse_id(&id, "administrator")?;

    let current_password = body.current_password.unwrap_or_default();
    let new_password = body.new_password.unwrap_or_default();
    let mut v = Validator::new();
    v.check(!current_password.is_empty(), "currentPassword", "Current password is required");
    v.password("newPassword", &new_password);
    v.finish()?;

    let repo = repo(&state);
    let admin = repo.select_id(id).await?.ok_or_else(missing)?;
    if !verify_password(&current_password, &admin.password_hash) {
        tracing::warn!("{} supplied a wrong current password for {}", principal.email, admin.email);
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    repo.set_password(admin.id, &hash_password(&new_password)?).await?;
    tracing::info!("{} changed the password of {}", principal.email, admin.email);
    Ok(ApiResponse::success(()).message("Password updated successfully"))
}
