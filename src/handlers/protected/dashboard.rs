// handlers/protected/dashboard.rs - Aggregates for the admin dashboard

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Permission;
use crate::error::ApiError;
use crate::handlers::utils::non_blank;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, AuthPrincipal};
use crate::services::dashboard_service::{Analytics, Metric, Period, SystemHealth, TimeRange};
use crate::services::{fallback, DashboardService};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    pub campus: Option<String>,
    pub time_range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub metric: Option<String>,
    pub period: Option<String>,
    pub campus: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CampusQuery {
    pub campus: Option<String>,
}

fn service(state: &AppState) -> DashboardService {
    DashboardService::new(state.db.pool().clone())
}

/// GET /api/dashboard/overview - totals, growth, breakdowns and recent activity
pub async fn overview(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    ApiQuery(query): ApiQuery<OverviewQuery>,
) -> Result<Response, ApiError> {
    principal.require(Permission::DashboardRead)?;
    let range = match non_blank(query.time_range.as_deref()) {
        Some(raw) => raw.parse::<TimeRange>()?,
        None => TimeRange::Month,
    };
    let campus = non_blank(query.campus.as_deref());

    match service(&state).overview(campus, range).await {
        Ok(overview) => Ok(ApiResponse::success(overview).into_response()),
        Err(e) if fallback::should_serve(&e) => {
            Ok(ApiResponse::success(fallback::overview(range.as_str())).fallback().into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/dashboard/analytics - creation series over the last twelve months
pub async fn analytics(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> ApiResult<Analytics> {
    principal.require(Permission::DashboardAnalytics)?;
    let metric = match non_blank(query.metric.as_deref()) {
        Some(raw) => raw.parse::<Metric>()?,
        None => Metric::Buildings,
    };
    let period = match non_blank(query.period.as_deref()) {
        Some(raw) => raw.parse::<Period>()?,
        None => Period::Monthly,
    };

    let analytics = service(&state).analytics(metric, period, non_blank(query.campus.as_deref())).await?;
    Ok(ApiResponse::success(analytics))
}

/// GET /api/dashboard/health - store status, collection counts and data issues
pub async fn health(Extension(state): Extension<AppState>, Extension(principal): Extension<AuthPrincipal>) -> ApiResult<SystemHealth> {
    principal.require(Permission::DashboardRead)?;
    let uptime = state.started_at.elapsed().as_secs();
    let health = service(&state).health(&state.db, uptime).await?;
    if !health.issues.is_empty() {
        tracing::warn!("Dashboard health reported {} issues", health.issues.len());
    }
    Ok(ApiResponse::success(health))
}

/// GET /api/dashboard/quick-stats - widget counts
pub async fn quick_stats(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    ApiQuery(query): ApiQuery<CampusQuery>,
) -> Result<Response, ApiError> {
    principal.require(Permission::DashboardRead)?;
    let campus = non_blank(query.campus.as_deref());

    match service(&state).quick_stats(campus).await {
        Ok(stats) => Ok(ApiResponse::success(stats).into_response()),
        Err(e) if fallback::should_serve(&e) => Ok(ApiResponse::success(fallback::quick_stats(campus)).fallback().into_response()),
        Err(e) => Err(e.into()),
    }
}
