// handlers/protected/notifications.rs - The calling administrator's inbox

use axum::extract::{Extension, Path};
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::Notification;
use crate::database::Repository;
use crate::error::ApiError;
use crate::handlers::utils::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthPrincipal};

const INBOX_SIZE: i64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

fn repo(state: &AppState) -> Repository<Notification> {
    Repository::new(state.db.pool().clone())
}

/// GET /api/notifications - latest notifications plus the unread count
pub async fn list(Extension(state): Extension<AppState>, Extension(principal): Extension<AuthPrincipal>) -> ApiResult<Inbox> {
    principal.require_admin()?;
    let repo = repo(&state);
    let (notifications, unread_count) =
        tokio::try_join!(repo.latest_for(principal.id, INBOX_SIZE), repo.unread_count(principal.id))?;
    Ok(ApiResponse::success(Inbox { notifications, unread_count }))
}

/// PUT /api/notifications/:id/read - only the recipient may mark a notification
pub async fn mark_read(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<AuthPrincipal>,
    Path(id): Path<String>,
) -> ApiResult<Notification> {
    principal.require_admin()?;
    let id = parse_id(&id, "notification")?;
    let notification = repo(&state)
        .mark_read(id, principal.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(ApiResponse::success(notification).message("Notification marked as read"))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(Extension(state): Extension<AppState>, Extension(principal): Extension<AuthPrincipal>) -> ApiResult<()> {
    principal.require_admin()?;
    let updated = repo(&state).mark_all_read(principal.id).await?;
    tracing::debug!("{} marked {} notifications read", principal.email, updated);
    Ok(ApiResponse::success(()).message("All notifications marked as read"))
}
