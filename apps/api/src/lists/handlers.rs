use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::lists::service::{
    add_item, create_list, delete_list, list_detail, lists_of_owner, remove_item, update_list,
    AddItemRequest, CreateListRequest, ListDetail, ListPatch,
};
use crate::models::shared_list::{SharedListItemRow, SharedListRow};
use crate::params::Actor;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ViewerQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<Uuid>,
    pub owner_id: Uuid,
}

/// POST /api/v1/lists
pub async fn handle_create_list(
    State(state): State<AppState>,
    Json(req): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<SharedListRow>), AppError> {
    let list = create_list(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// GET /api/v1/lists
pub async fn handle_owner_lists(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<Vec<SharedListRow>>, AppError> {
    Ok(Json(
        lists_of_owner(&state.db, params.owner_id, params.user_id).await?,
    ))
}

/// GET /api/v1/lists/:id
pub async fn handle_get_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<ListDetail>, AppError> {
    Ok(Json(list_detail(&state.db, id, params.user_id).await?))
}

/// PATCH /api/v1/lists/:id
pub async fn handle_update_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ListPatch>,
) -> Result<Json<SharedListRow>, AppError> {
    Ok(Json(update_list(&state.db, id, &patch).await?))
}

/// DELETE /api/v1/lists/:id
pub async fn handle_delete_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(actor): Query<Actor>,
) -> Result<StatusCode, AppError> {
    delete_list(&state.db, id, actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/lists/:id/items
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<SharedListItemRow>), AppError> {
    let item = add_item(&state.db, id, &req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/v1/lists/:id/items/:item_id
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Query(actor): Query<Actor>,
) -> Result<StatusCode, AppError> {
    remove_item(&state.db, id, item_id, actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
