use axum::{extract::Extension, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::config;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Campus Navigation API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": format!("{:?}", config::config().environment).to_lowercase(),
        "endpoints": {
            "health": "/api/health",
            "buildings": "/api/buildings",
            "paths": "/api/paths",
            "dashboard": "/api/dashboard",
            "admins": "/api/admins",
            "users": "/api/users",
            "notifications": "/api/notifications"
        }
    }))
}

/// GET /api/health - liveness plus a database ping; 503 when the store is down
pub async fn health(Extension(state): Extension<AppState>) -> (StatusCode, Json<Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "status": "healthy",
                "database": "connected",
                "uptime": uptime,
                "timestamp": Utc::now()
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "status": "unhealthy",
                    "database": "disconnected",
                    "uptime": uptime,
                    "timestamp": Utc::now()
                })),
            )
        }
    }
}
