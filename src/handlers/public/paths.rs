// handlers/public/paths.rs - Read-only path catalog and geo lookups

use axum::extract::{Extension, Path as UrlPath};
use serde::Deserialize;
use serde_json::json;

use crate::app::AppState;
use crate::config;
use crate::database::models::{Path, PathRow, PathStatus, PathType};
use crate::database::store::paths::PathStats;
use crate::database::Repository;
use crate::error::ApiError;
use crate::geo::NearbyQuery;
use crate::handlers::utils::{
    bounded_limit, like_pattern, non_blank, page_filter, parse_coordinate, parse_id, search_clause, sort_order, Page,
};
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, Pagination};

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("type", "path_type"),
    ("campus", "campus"),
    ("distance", "distance"),
    ("popularity", "popularity"),
    ("status", "status"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub campus: Option<String>,
    #[serde(rename = "type")]
    pub path_type: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub accessible: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NearbyParams {
    pub radius: Option<f64>,
    pub limit: Option<u32>,
    pub campus: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CampusParams {
    pub campus: Option<String>,
    pub limit: Option<u32>,
}

fn repo(state: &AppState) -> Repository<PathRow> {
    Repository::new(state.db.pool().clone())
}

fn to_api(rows: Vec<PathRow>) -> Vec<Path> {
    rows.into_iter().map(Path::from).collect()
}

/// GET /api/paths - filtered, sorted, paginated listing (active paths unless `status` is given)
pub async fn list(Extension(state): Extension<AppState>, ApiQuery(query): ApiQuery<ListQuery>) -> ApiResult<Vec<Path>> {
    let max = config::config().api.max_page_size;
    let page = Page::from_query(query.page, Some(query.limit.unwrap_or(10)), max)?;
    let order = sort_order(query.sort_by.as_deref(), query.sort_order.as_deref(), SORT_COLUMNS, ("name", "asc"))?;

    let status = match non_blank(query.status.as_deref()) {
        Some(raw) => raw.to_lowercase().parse::<PathStatus>()?,
        None => PathStatus::Active,
    };
    let mut conditions = vec![json!({ "status": status.as_str() })];
    if let Some(campus) = non_blank(query.campus.as_deref()) {
        conditions.push(json!({ "campus": campus }));
    }
    if let Some(raw) = non_blank(query.path_type.as_deref()) {
        let path_type = raw.to_lowercase().parse::<PathType>()?;
        conditions.push(json!({ "path_type": path_type.as_str() }));
    }
    if query.accessible == Some(true) {
        conditions.push(json!({ "wheelchair_accessible": true }));
    }
    if let Some(term) = non_blank(query.search.as_deref()) {
        let mut any = search_clause(term, &["name", "description", "start_name", "end_name"]);
        if let Some(list) = any.as_array_mut() {
            list.push(json!({ "tags": { "$any_ilike": like_pattern(term) } }));
        }
        conditions.push(json!({ "$or": any }));
    }

    let (rows, total) = repo(&state).select_page(page_filter(conditions, order, page)).await?;
    Ok(ApiResponse::success(to_api(rows)).pagination(Pagination::new(page.page, page.limit, total)))
}

/// GET /api/paths/stats - totals, accessibility count, distance and popularity
pub async fn stats(Extension(state): Extension<AppState>) -> ApiResult<PathStats> {
    let stats = repo(&state).stats().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/paths/nearby/:lat/:lng - active paths with an endpoint within `radius` meters
pub async fn nearby(
    Extension(state): Extension<AppState>,
    UrlPath((lat, lng)): UrlPath<(String, String)>,
    ApiQuery(params): ApiQuery<NearbyParams>,
) -> ApiResult<Vec<Path>> {
    let geo = &config::config().geo;
    let limit = bounded_limit(params.limit, 10, geo.max_nearby_limit)?;
    let query = NearbyQuery::new(
        parse_coordinate(&lat, "latitude")?,
        parse_coordinate(&lng, "longitude")?,
        params.radius.unwrap_or(geo.default_radius_m),
        limit as usize,
    )?
    .capped(geo.max_radius_m)?;

    let paths: Vec<Path> = repo(&state)
        .nearby(&query, non_blank(params.campus.as_deref()))
        .await?
        .into_iter()
        .map(|(row, meters)| Path::from(row).with_query_distance(meters))
        .collect();
    let count = paths.len();
    Ok(ApiResponse::success(paths).count(count))
}

/// GET /api/paths/accessible - wheelchair-accessible active paths
pub async fn accessible(Extension(state): Extension<AppState>, ApiQuery(params): ApiQuery<CampusParams>) -> ApiResult<Vec<Path>> {
    let limit = bounded_limit(params.limit, 20, 50)?;
    let rows = repo(&state).accessible(non_blank(params.campus.as_deref()), limit as i32).await?;
    Ok(ApiResponse::success(to_api(rows)))
}

/// GET /api/paths/popular - active paths by popularity
pub async fn popular(Extension(state): Extension<AppState>, ApiQuery(params): ApiQuery<CampusParams>) -> ApiResult<Vec<Path>> {
    let limit = bounded_limit(params.limit, 10, 20)?;
    let rows = repo(&state).popular(non_blank(params.campus.as_deref()), limit as i32).await?;
    Ok(ApiResponse::success(to_api(rows)))
}

/// GET /api/paths/types/:type - active paths of one type
pub async fn by_type(
    Extension(state): Extension<AppState>,
    UrlPath(raw): UrlPath<String>,
    ApiQuery(params): ApiQuery<CampusParams>,
) -> ApiResult<Vec<Path>> {
    let path_type = raw
        .parse::<PathType>()
        .map_err(|_| ApiError::field("type", "Invalid path type"))?;
    let rows = repo(&state).of_type(path_type, non_blank(params.campus.as_deref())).await?;
    Ok(ApiResponse::success(to_api(rows)))
}

/// GET /api/paths/:id
pub async fn show(Extension(state): Extension<AppState>, UrlPath(id): UrlPath<String>) -> ApiResult<Path> {
    let id = parse_id(&id, "path")?;
    let row = repo(&state).select_404(id, "Path").await?;
    Ok(ApiResponse::success(Path::from(row)))
}
