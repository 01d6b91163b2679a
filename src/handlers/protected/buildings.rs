// handlers/protected/buildings.rs - Building writes

use axum::extract::{Extension, Path};

use crate::app::AppState;
use crate::database::models::building::{BuildingDraft, BuildingInput};
use crate::database::models::{Announcement, Building, BuildingRow, Permission};
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthPrincipal};
use crate::services::NotifyService;

fn repo(state: &AppState) -> Repository<BuildingRow> {
    Repository::new(state.db.pool().clone())
}

/// POST /api/buildings - 201 with the stored building; alert-enabled admins are notified
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    ApiJson(input): ApiJson<BuildingInput>,
) -> ApiResult<Building> {
    principal.require(Permission::BuildingsWrite)?;
    let draft = BuildingDraft::create(input)?;
    let row = repo(&state).insert(&draft).await?;

    tracing::info!("{} created building {} ({})", principal.email, row.code, row.id);
    NotifyService::new(state.db.pool().clone())
        .announce(&Announcement::new_building(&row.name, &row.code))
        .await;

    Ok(ApiResponse::created(Building::from(row)).message("Building created successfully"))
}

/// PUT /api/buildings/:id - partial update
pub async fn update(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<BuildingInput>,
) -> ApiResult<Building> {
    principal.require(Permission::BuildingsWrite)?;
    let id = parse_id(&id, "building")?;
    let repo = repo(&state);
    let current = repo.select_404(id, "Building").await?;
    let draft = BuildingDraft::update(&current, input)?;
    let row = repo
        .update(id, &draft)
        .await?
        .ok_or_else(|| ApiError::not_found("Building not found"))?;

    tracing::info!("{} updated building {}", principal.email, row.id);
    Ok(ApiResponse::success(Building::from(row)).message("Building updated successfully"))
}

/// DELETE /api/buildings/:id - returns the removed building
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<Building> {
    principal.require(Permission::BuildingsDelete)?;
    let id = parse_id(&id, "building")?;
    let row = repo(&state)
        .delete_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Building not found"))?;

    tracing::info!("{} deleted building {} ({})", principal.email, row.code, row.id);
    Ok(ApiResponse::success(Building::from(row)).message("Building deleted successfully"))
}
