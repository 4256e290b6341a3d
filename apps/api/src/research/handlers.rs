use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::research::service::{refresh_research, RefreshReport};
use crate::state::AppState;

/// POST /api/v1/companies/:slug/research/refresh
pub async fn handle_refresh_research(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RefreshReport>, AppError> {
    info!("Research refresh requested for {slug}");
    let report = refresh_research(
        &state.db,
        &state.llm,
        state.news.as_ref(),
        &state.s3,
        &state.config.s3_bucket,
        &slug,
    )
    .await?;
    Ok(Json(report))
}
