use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::connections::lifecycle::{ConnectionAction, RequestAction};
use crate::connections::service::{
    change_status, list_connections, pending_requests, remove_connection, respond_to_request,
    send_request, set_strength, ConnectionView, PendingRequests, RequestOutcome, SendRequest,
};
use crate::errors::AppError;
use crate::models::connection::{ConnectionRequestRow, ConnectionRow};
use crate::params::Actor;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StrengthUpdate {
    pub user_id: Uuid,
    pub strength: f64,
}

/// POST /api/v1/connections/requests
pub async fn handle_send_request(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<(StatusCode, Json<ConnectionRequestRow>), AppError> {
    let request = send_request(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/v1/connections/requests
pub async fn handle_pending_requests(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<PendingRequests>, AppError> {
    Ok(Json(pending_requests(&state.db, actor.user_id).await?))
}

/// POST /api/v1/connections/requests/:id/accept
pub async fn handle_accept_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actor): Json<Actor>,
) -> Result<Json<RequestOutcome>, AppError> {
    Ok(Json(
        respond_to_request(&state.db, id, actor.user_id, RequestAction::Accept).await?,
    ))
}

/// POST /api/v1/connections/requests/:id/reject
pub async fn handle_reject_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actor): Json<Actor>,
) -> Result<Json<RequestOutcome>, AppError> {
    Ok(Json(
        respond_to_request(&state.db, id, actor.user_id, RequestAction::Reject).await?,
    ))
}

/// POST /api/v1/connections/requests/:id/cancel
pub async fn handle_cancel_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actor): Json<Actor>,
) -> Result<Json<RequestOutcome>, AppError> {
    Ok(Json(
        respond_to_request(&state.db, id, actor.user_id, RequestAction::Cancel).await?,
    ))
}

/// GET /api/v1/connections
pub async fn handle_list_connections(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<Vec<ConnectionView>>, AppError> {
    Ok(Json(list_connections(&state.db, actor.user_id).await?))
}

/// PATCH /api/v1/connections/:id/strength
pub async fn handle_set_strength(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StrengthUpdate>,
) -> Result<Json<ConnectionRow>, AppError> {
    Ok(Json(
        set_strength(&state.db, id, req.user_id, req.strength).await?,
    ))
}

/// POST /api/v1/connections/:id/block
pub async fn handle_block(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actor): Json<Actor>,
) -> Result<Json<ConnectionRow>, AppError> {
    let row = change_status(&state.db, id, actor.user_id, ConnectionAction::Block).await?;
    Ok(Json(row))
}

/// POST /api/v1/connections/:id/unblock
pub async fn handle_unblock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actor): Json<Actor>,
) -> Result<Json<ConnectionRow>, AppError> {
    let row = change_status(
        &state.db,
        id,
        actor.user_id,
        ConnectionAction::Unblock { by: actor.user_id },
    )
    .await?;
    Ok(Json(row))
}

/// DELETE /api/v1/connections/:id
pub async fn handle_remove_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(actor): Query<Actor>,
) -> Result<StatusCode, AppError> {
    remove_connection(&state.db, id, actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
