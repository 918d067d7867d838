//! Notification routes.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use uuid::Uuid;

use mindmend_common::error::AppError;
use mindmend_common::types::Notification;
use mindmend_engine::store::NotificationStore;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}/read", put(mark_read))
        .route("/api/notifications/read-all", put(mark_all_read))
}

#[derive(Debug, serde::Deserialize)]
struct ListParams {
    limit: Option<i64>,
}

/// GET /api/notifications — the caller's notifications, newest first,
/// capped at 50.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications =
        NotificationStore::list_for_recipient(&state.pool, auth.user_id, params.limit).await?;
    Ok(Json(notifications))
}

/// PUT /api/notifications/:id/read — mark one notification read. Idempotent.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    NotificationStore::mark_read(&state.pool, id, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "updated": true })))
}

/// PUT /api/notifications/read-all — mark all of the caller's unread
/// notifications read.
async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let updated = NotificationStore::mark_all_read(&state.pool, auth.user_id).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
