// handlers/public/buildings.rs - Read-only building catalog

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::config;
use crate::database::models::{Building, BuildingRow, BuildingStatus, BuildingType};
use crate::database::store::buildings::BuildingStats;
use crate::database::Repository;
use crate::error::ApiError;
use crate::geo::NearbyQuery;
use crate::handlers::utils::{bounded_limit, non_blank, page_filter, parse_coordinate, parse_id, search_clause, sort_order, Page};
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, Pagination};
use crate::services::fallback;

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("code", "code"),
    ("type", "building_type"),
    ("campus", "campus"),
    ("status", "status"),
    ("floors", "floors"),
    ("capacity", "capacity"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub campus: Option<String>,
    #[serde(rename = "type")]
    pub building_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NearbyParams {
    pub radius: Option<f64>,
    pub limit: Option<u32>,
}

fn repo(state: &AppState) -> Repository<BuildingRow> {
    Repository::new(state.db.pool().clone())
}

/// GET /api/buildings - filtered, sorted, paginated listing
pub async fn list(Extension(state): Extension<AppState>, ApiQuery(query): ApiQuery<ListQuery>) -> Result<Response, ApiError> {
    let max = config::config().api.max_page_size;
    let page = Page::from_query(query.page, Some(query.limit.unwrap_or(DEFAULT_LIMIT)), max)?;
    let order = sort_order(query.sort_by.as_deref(), query.sort_order.as_deref(), SORT_COLUMNS, ("name", "asc"))?;

    let mut conditions = Vec::new();
    if let Some(campus) = non_blank(query.campus.as_deref()) {
        conditions.push(json!({ "campus": campus }));
    }
    if let Some(raw) = non_blank(query.building_type.as_deref()) {
        let building_type = BuildingType::from_input(raw).ok_or_else(|| ApiError::field("type", "Invalid building type"))?;
        conditions.push(json!({ "building_type": building_type.as_str() }));
    }
    if let Some(raw) = non_blank(query.status.as_deref()) {
        let status = BuildingStatus::from_input(raw).ok_or_else(|| ApiError::field("status", "Invalid status"))?;
        conditions.push(json!({ "status": status.as_str() }));
    }
    if let Some(term) = non_blank(query.search.as_deref()) {
        conditions.push(json!({ "$or": search_clause(term, &["name", "code", "description"]) }));
    }

    match repo(&state).select_page(page_filter(conditions, order, page)).await {
        Ok((rows, total)) => {
            let buildings: Vec<Building> = rows.into_iter().map(Building::from).collect();
            Ok(ApiResponse::success(buildings)
                .pagination(Pagination::new(page.page, page.limit, total))
                .into_response())
        }
        Err(e) if fallback::should_serve(&e) => {
            let sample = fallback::buildings();
            let count = sample.len();
            Ok(ApiResponse::success(sample)
                .pagination(Pagination::single(count))
                .fallback()
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/buildings/stats - totals by type, campus and status
pub async fn stats(Extension(state): Extension<AppState>) -> ApiResult<BuildingStats> {
    let stats = repo(&state).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/buildings/nearby/:lat/:lng - active buildings within `radius` meters
pub async fn nearby(
    Extension(state): Extension<AppState>,
    Path((lat, lng)): Path<(String, String)>,
    ApiQuery(params): ApiQuery<NearbyParams>,
) -> ApiResult<Vec<Building>> {
    let geo = &config::config().geo;
    let limit = bounded_limit(params.limit, DEFAULT_LIMIT, geo.max_nearby_limit)?;
    let query = NearbyQuery::new(
        parse_coordinate(&lat, "latitude")?,
        parse_coordinate(&lng, "longitude")?,
        params.radius.unwrap_or(geo.default_radius_m),
        limit as usize,
    )?
    .capped(geo.max_radius_m)?;

    let buildings: Vec<Building> = repo(&state)
        .nearby(&query)
        .await?
        .into_iter()
        .map(|(row, meters)| Building::from(row).with_distance(meters))
        .collect();
    let count = buildings.len();
    Ok(ApiResponse::success(buildings).count(count))
}

/// GET /api/buildings/:id
pub async fn show(Extension(state): Extension<AppState>, Path(id): Path<String>) -> ApiResult<Building> {
    let id = parse_id(&id, "building")?;
    let row = repo(&state).select_404(id, "Building").await?;
    Ok(ApiResponse::success(Building::from(row)))
}
