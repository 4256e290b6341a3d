use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::research::news::NewsSearch;
use crate::trust::cache::RankingCache;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Redis-backed cache for `/api/v1/rankings`.
    pub ranking_cache: RankingCache,
    pub s3: S3Client,
    pub llm: LlmClient,
    /// News provider for research refreshes. Default: Tavily.
    pub news: Arc<dyn NewsSearch>,
    pub config: Config,
}
