use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::companies::service::{
    company_detail, company_history, company_sources, create_company, require_company,
    search_companies, update_company, CompanyDetail, CompanyPatch, CreateCompanyRequest,
};
use crate::errors::AppError;
use crate::models::company::{CompanyEditRow, CompanyRow, CompanySourceRow};
use crate::params::clamp_limit;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// POST /api/v1/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyRow>), AppError> {
    let company = create_company(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/v1/companies
pub async fn handle_search_companies(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<CompanyRow>>, AppError> {
    let companies =
        search_companies(&state.db, params.q.as_deref(), clamp_limit(params.limit)).await?;
    Ok(Json(companies))
}

/// GET /api/v1/companies/:slug
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CompanyDetail>, AppError> {
    Ok(Json(company_detail(&state.db, &slug).await?))
}

/// PATCH /api/v1/companies/:slug
pub async fn handle_update_company(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(patch): Json<CompanyPatch>,
) -> Result<Json<CompanyRow>, AppError> {
    Ok(Json(
        update_company(&state.db, &state.ranking_cache, &slug, &patch).await?,
    ))
}

/// GET /api/v1/companies/:slug/history
pub async fn handle_company_history(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CompanyEditRow>>, AppError> {
    Ok(Json(company_history(&state.db, &slug).await?))
}

/// GET /api/v1/companies/:slug/sources
pub async fn handle_company_sources(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CompanySourceRow>>, AppError> {
    let company = require_company(&state.db, &slug).await?;
    Ok(Json(company_sources(&state.db, company.id).await?))
}
