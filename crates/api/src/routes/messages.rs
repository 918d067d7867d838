//! Direct message routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use mindmend_common::error::AppError;
use mindmend_common::types::Message;
use mindmend_engine::messages::{MessageService, SendMessageParams};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/messages", post(send_message))
        .route("/api/messages/{peer_id}", get(get_conversation))
}

/// POST /api/messages — send a direct message to another user.
async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<SendMessageParams>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let message =
        MessageService::send(&state.pool, &state.dispatcher, auth.user_id, &params).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/messages/:peer_id — the conversation with a peer, oldest first.
async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(peer_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = MessageService::conversation(&state.pool, auth.user_id, peer_id).await?;
    Ok(Json(messages))
}
