// handlers/protected/paths.rs - Path writes, images and usage counters

use axum::extract::{Extension, Path as UrlPath};

use crate::app::AppState;
use crate::database::models::path::{ImageInput, PathDraft, PathInput, UsageInput};
use crate::database::models::{Announcement, Path, PathRow, Permission};
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthPrincipal};
use crate::services::NotifyService;

fn repo(state: &AppState) -> Repository<PathRow> {
    Repository::new(state.db.pool().clone())
}

fn missing() -> ApiError {
    ApiError::not_found("Path not found")
}

/// POST /api/paths - distance and travel times are derived when not supplied
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    ApiJson(input): ApiJson<PathInput>,
) -> ApiResult<Path> {
    principal.require(Permission::PathsWrite)?;
    let draft = PathDraft::create(input)?;
    let row = repo(&state).insert(&draft, principal.id).await?;

    tracing::info!("{} created path {} ({}, {} m)", principal.email, row.name, row.id, row.distance);
    NotifyService::new(state.db.pool().clone())
        .announce(&Announcement::new_path(&row.name, &row.campus))
        .await;

    Ok(ApiResponse::created(Path::from(row)).message("Path created successfully"))
}

/// PUT /api/paths/:id - partial update; metrics are re-derived when the coordinates change
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    UrlPath(id): UrlPath<String>,
    ApiJson(input): ApiJson<PathInput>,
) -> ApiResult<Path> {
    principal.require(Permission::PathsWrite)?;
    let id = parse_id(&id, "path")?;
    let repo = repo(&state);
    let current = repo.select_404(id, "Path").await?;
    let draft = PathDraft::update(&current, input)?;
    let row = repo.update(id, &draft, principal.id).await?.ok_or_else(missing)?;

    tracing::info!("{} updated path {} to version {}", principal.email, row.id, row.version);
    Ok(ApiResponse::success(Path::from(row)).message("Path updated successfully"))
}

/// DELETE /api/paths/:id
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    UrlPath(id): UrlPath<String>,
) -> ApiResult<Path> {
    principal.require(Permission::PathsDelete)?;
    let id = parse_id(&id, "path")?;
    let row = repo(&state).delete_id(id).await?.ok_or_else(missing)?;

    tracing::info!("{} deleted path {} ({})", principal.email, row.name, row.id);
    Ok(ApiResponse::success(Path::from(row)).message("Path deleted successfully"))
}

/// POST /api/paths/:id/images - attach an image by URL
pub async fn add_image(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    UrlPath(id): UrlPath<String>,
    ApiJson(input): ApiJson<ImageInput>,
) -> ApiResult<Path> {
    principal.require(Permission::PathsWrite)?;
    let id = parse_id(&id, "path")?;
    let image = input.into_image(principal.id)?;
    let row = repo(&state).append_image(id, &image, principal.id).await?.ok_or_else(missing)?;
    Ok(ApiResponse::success(Path::from(row)).message("Image added successfully"))
}

/// PUT /api/paths/:id/usage - popularity and average user counters
pub async fn update_usage(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    UrlPath(id): UrlPath<String>,
    ApiJson(input): ApiJson<UsageInput>,
) -> ApiResult<Path> {
    principal.require(Permission::PathsWrite)?;
    let id = parse_id(&id, "path")?;
    let repo = repo(&state);
    let current = repo.select_404(id, "Path").await?;

    let mut usage = current.usage.0;
    input.apply(&mut usage)?;
    let row = repo.set_usage(id, &usage, principal.id).await?.ok_or_else(missing)?;
    Ok(ApiResponse::success(Path::from(row)).message("Usage statistics updated successfully"))
}
