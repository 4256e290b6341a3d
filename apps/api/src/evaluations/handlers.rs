use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluations::service::{
    add_reply, company_evaluations, create_evaluation, delete_evaluation, evaluation_detail,
    received_evaluations, toggle_like, update_evaluation, CreateEvaluationRequest,
    EvaluationDetail, EvaluationListItem, LikeState, UpdateEvaluationRequest,
};
use crate::models::evaluation::{EvaluationReplyRow, EvaluationRow};
use crate::params::Actor;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReplyRequest {
    pub user_id: Uuid,
    pub body: String,
}

/// POST /api/v1/evaluations
pub async fn handle_create_evaluation(
    State(state): State<AppState>,
    Json(req): Json<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<EvaluationRow>), AppError> {
    let evaluation = create_evaluation(&state.db, &state.ranking_cache, &req).await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// GET /api/v1/evaluations/:id
pub async fn handle_get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvaluationDetail>, AppError> {
    Ok(Json(evaluation_detail(&state.db, id).await?))
}

/// GET /api/v1/companies/:slug/evaluations
pub async fn handle_company_evaluations(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<EvaluationListItem>>, AppError> {
    Ok(Json(company_evaluations(&state.db, &slug).await?))
}

/// GET /api/v1/users/:id/evaluations
pub async fn handle_received_evaluations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<EvaluationListItem>>, AppError> {
    Ok(Json(received_evaluations(&state.db, user_id).await?))
}

/// PATCH /api/v1/evaluations/:id
pub async fn handle_update_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEvaluationRequest>,
) -> Result<Json<EvaluationRow>, AppError> {
    Ok(Json(
        update_evaluation(&state.db, &state.ranking_cache, id, &req).await?,
    ))
}

/// DELETE /api/v1/evaluations/:id
pub async fn handle_delete_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(actor): Query<Actor>,
) -> Result<StatusCode, AppError> {
    delete_evaluation(&state.db, &state.ranking_cache, id, actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/evaluations/:id/like
pub async fn handle_toggle_like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(actor): Json<Actor>,
) -> Result<Json<LikeState>, AppError> {
    Ok(Json(toggle_like(&state.db, id, actor.user_id).await?))
}

/// POST /api/v1/evaluations/:id/replies
pub async fn handle_add_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplyRequest>,
) -> Result<(StatusCode, Json<EvaluationReplyRow>), AppError> {
    let reply = add_reply(&state.db, id, req.user_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}
