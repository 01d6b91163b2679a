// handlers/protected/users.rs - Portal user accounts and the caller's own profile

use axum::extract::{Extension, Path};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::config;
use crate::database::models::{Permission, Role, User, UserDraft, UserInput, UserRow, UserStatus};
use crate::database::store::users::UserStats;
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::utils::{non_blank, page_filter, parse_id, search_clause, sort_order, Page};
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthPrincipal, Pagination};

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("email", "email"),
    ("role", "role"),
    ("status", "status"),
    ("lastLogin", "last_login"),
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub role: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn repo(state: &AppState) -> Repository<UserRow> {
    Repository::new(state.db.pool().clone())
}

fn missing() -> ApiError {
    ApiError::not_found("User not found")
}

/// GET /api/users/me
pub async fn me(Extension(state): Extension<AppState>, Extension(principal): Extension<AuthPrincipal>) -> ApiResult<User> {
    principal.require_user()?;
    let row = repo(&state).select_id(principal.id).await?.ok_or_else(missing)?;
    Ok(ApiResponse::success(User::from(row)))
}

/// PUT /api/users/me - names, phone and department only
pub async fn update_me(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<User> {
    principal.require_user()?;
    let repo = repo(&state);
    let current = repo.select_id(principal.id).await?.ok_or_else(missing)?;
    let draft = UserDraft::update(&current, input.self_service())?;
    let row = repo.update(principal.id, &draft).await?.ok_or_else(missing)?;
    Ok(ApiResponse::success(User::from(row)).message("Profile updated successfully"))
}

/// GET /api/users - filtered, paginated listing
pub async fn list(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<User>> {
    principal.require(Permission::UsersRead)?;
    let max = config::config().api.max_page_size;
    let page = Page::from_query(query.page, Some(query.limit.unwrap_or(10)), max)?;
    let order = sort_order(query.sort_by.as_deref(), query.sort_order.as_deref(), SORT_COLUMNS, ("createdAt", "desc"))?;

    let mut conditions = Vec::new();
    if let Some(raw) = non_blank(query.role.as_deref()) {
        conditions.push(json!({ "role": raw.to_lowercase().parse::<Role>()?.as_str() }));
    }
    if let Some(raw) = non_blank(query.status.as_deref()) {
        conditions.push(json!({ "status": raw.to_lowercase().parse::<UserStatus>()?.as_str() }));
    }
    if let Some(term) = non_blank(query.search.as_deref()) {
        conditions.push(json!({ "$or": search_clause(term, &["first_name", "last_name", "email", "department"]) }));
    }

    let (rows, total) = repo(&state).select_page(page_filter(conditions, order, page)).await?;
    let users: Vec<User> = rows.into_iter().map(User::from).collect();
    Ok(ApiResponse::success(users).pagination(Pagination::new(page.page, page.limit, total)))
}

/// GET /api/users/stats - totals by role and status, registrations in the last 30 days
pub async fn stats(Extension(state): Extension<AppState>, Extension(principal): Extension<AuthPrincipal>) -> ApiResult<UserStats> {
    principal.require(Permission::UsersWrite)?;
    let stats = repo(&state).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/users/:id
pub async fn show(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    principal.require(Permission::UsersRead)?;
    let id = parse_id(&id, "user")?;
    let row = repo(&state).select_id(id).await?.ok_or_else(missing)?;
    Ok(ApiResponse::success(User::from(row)))
}

/// PUT /api/users/:id - a role change re-derives the permission flags
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<User> {
    principal.require(Permission::UsersWrite)?;
    let id = parse_id(&id, "user")?;
    let repo = repo(&state);
    let current = repo.select_id(id).await?.ok_or_else(missing)?;
    let draft = UserDraft::update(&current, input)?;
    let row = repo.update(id, &draft).await?.ok_or_else(missing)?;

    tracing::info!("{} updated user {} (role {})", principal.email, row.email, row.role);
    Ok(ApiResponse::success(User::from(row)).message("User updated successfully"))
}

/// DELETE /api/users/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    principal.require(Permission::UsersDelete)?;
    let id = parse_id(&id, "user")?;
    if id == principal.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }
    let row = repo(&state).delete_id(id).await?.ok_or_else(missing)?;

    tracing::info!("{} deleted user {}", principal.email, row.email);
    Ok(ApiResponse::success(()).message("User deleted successfully"))
}
