use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::companies::service::require_company;
use crate::connections::service::{active_connections, connection_strengths};
use crate::errors::AppError;
use crate::models::evaluation::EvaluationTarget;
use crate::params::{clamp_limit, Actor};
use crate::state::AppState;
use crate::trust::aggregation::{
    personal_trust_map, rank_companies, summarize, RankedCompany, TrustMapEntry, TrustSummary,
};
use crate::trust::graph::{build_trust_graph, TrustGraph};
use crate::trust::store;
use crate::users::service::require_user;

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/companies/:slug/trust
pub async fn handle_company_trust(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TrustSummary>, AppError> {
    require_company(&state.db, &slug).await?;
    let evaluations = store::company_evaluations(&state.db, &slug).await?;
    Ok(Json(summarize(&evaluations, Utc::now())))
}

/// GET /api/v1/users/:id/trust
pub async fn handle_user_trust(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<TrustSummary>, AppError> {
    require_user(&state.db, user_id).await?;
    let evaluations = store::person_evaluations(&state.db, user_id).await?;
    Ok(Json(summarize(&evaluations, Utc::now())))
}

/// GET /api/v1/rankings
pub async fn handle_rankings(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Vec<RankedCompany>>, AppError> {
    let limit = clamp_limit(params.limit);
    if let Some(cached) = state.ranking_cache.get(limit).await {
        debug!("Ranking cache hit (limit {limit})");
        return Ok(Json(cached));
    }

    let ranking = rank_companies(store::company_stats(&state.db).await?, limit);
    state.ranking_cache.put(limit, &ranking).await;
    Ok(Json(ranking))
}

/// GET /api/v1/trust-map
pub async fn handle_trust_map(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<Vec<TrustMapEntry>>, AppError> {
    require_user(&state.db, actor.user_id).await?;
    let strengths = connection_strengths(&state.db, actor.user_id).await?;

    let mut evaluators: Vec<Uuid> = strengths.keys().copied().collect();
    evaluators.push(actor.user_id);
    let evaluations = store::evaluations_by(&state.db, &evaluators).await?;

    Ok(Json(personal_trust_map(
        actor.user_id,
        &evaluations,
        &strengths,
        Utc::now(),
    )))
}

/// GET /api/v1/trust-graph
pub async fn handle_trust_graph(
    State(state): State<AppState>,
    Query(actor): Query<Actor>,
) -> Result<Json<TrustGraph>, AppError> {
    require_user(&state.db, actor.user_id).await?;
    let connections = active_connections(&state.db, actor.user_id).await?;

    let mut members: BTreeSet<Uuid> = BTreeSet::from([actor.user_id]);
    for connection in &connections {
        members.insert(connection.user_a);
        members.insert(connection.user_b);
    }
    let member_ids: Vec<Uuid> = members.iter().copied().collect();
    let evaluations = store::evaluations_by(&state.db, &member_ids).await?;

    let mut user_ids = members;
    let mut slugs = BTreeSet::new();
    for evaluation in &evaluations {
        match evaluation.target() {
            Some(EvaluationTarget::Company(slug)) => {
                slugs.insert(slug);
            }
            Some(EvaluationTarget::Person(id)) => {
                user_ids.insert(id);
            }
            None => {}
        }
    }
    let user_ids: Vec<Uuid> = user_ids.into_iter().collect();
    let slugs: Vec<String> = slugs.into_iter().collect();
    let labels = store::graph_labels(&state.db, &user_ids, &slugs).await?;

    Ok(Json(build_trust_graph(
        actor.user_id,
        &connections,
        &evaluations,
        &labels,
        Utc::now(),
    )))
}
