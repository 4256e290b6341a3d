use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;
use crate::users::service::{
    create_user, require_user, update_preferences, CreateUserRequest, PreferencesPatch,
};

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserRow>), AppError> {
    let user = create_user(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRow>, AppError> {
    Ok(Json(require_user(&state.db, id).await?))
}

/// PATCH /api/v1/users/:id/preferences
pub async fn handle_update_preferences(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<UserRow>, AppError> {
    Ok(Json(update_preferences(&state.db, id, &patch).await?))
}
