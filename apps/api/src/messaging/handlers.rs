use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::messaging::service::{
    inbox, mark_message_read, send_message, sent, thread, unread_count, SendMessage, UnreadCount,
};
use crate::models::message::MessageRow;
use crate::params::Actor;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ThreadQuery {
    pub user_id: Uuid,
    pub with: Uuid,
}

/// POST /api/v1/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessage>,
) -> Result<(StatusCode, Json<MessageRow>), AppError> {
    let message = send_message(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/v1/messages/inbox
pub async fn handle_inbox(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    Ok(Json(inbox(&state.db, actor.user_id).await?))
}

/// GET /api/v1/messages/sent
pub async fn handle_sent(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    Ok(Json(sent(&state.db, actor.user_id).await?))
}

/// GET /api/v1/messages/thread
pub async fn handle_thread(
    State(state): State<AppState>,
    Query(params): Query<ThreadQuery>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    Ok(Json(thread(&state.db, params.user_id, params.with).await?))
}

/// POST /api/v1/messages/:id/read
pub async fn handle_mark_message_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actor): Json<Actor>,
) -> Result<Json<MessageRow>, AppError> {
    Ok(Json(mark_message_read(&state.db, id, actor.user_id).await?))
}

/// GET /api/v1/messages/unread-count
pub async fn handle_unread_count(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<UnreadCount>, AppError> {
    Ok(Json(unread_count(&state.db, actor.user_id).await?))
}
