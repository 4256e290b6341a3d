use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::message::NotificationRow;
use crate::notifications::service::{list_notifications, mark_all_read, mark_read};
use crate::params::Actor;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NotificationQuery {
    pub user_id: Uuid,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// GET /api/v1/notifications
pub async fn handle_list_notifications(
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationRow>>, AppError> {
    Ok(Json(
        list_notifications(&state.db, params.user_id, params.unread_only).await?,
    ))
}

/// POST /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<Actor>,
) -> Result<Json<NotificationRow>, AppError> {
    Ok(Json(mark_read(&state.db, id, body.user_id).await?))
}

/// POST /api/v1/notifications/read-all
pub async fn handle_mark_all_read(
    State(state): State<AppState>,
    Json(body): Json<Actor>,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let updated = mark_all_read(&state.db, body.user_id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
