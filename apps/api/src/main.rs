mod companies;
mod config;
mod connections;
mod db;
mod errors;
mod evaluations;
mod lists;
mod llm_client;
mod messaging;
mod models;
mod notifications;
mod params;
mod research;
mod routes;
mod state;
mod trust;
mod users;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::research::news::TavilyClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::trust::cache::RankingCache;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Bond API v{}", env!("CARGO_PKG_VERSION"));

    // PostgreSQL (runs embedded migrations)
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    // Redis ranking cache
    let redis = redis::Client::open(config.redis_url.clone())?;
    let ranking_cache = RankingCache::new(redis, config.ranking_cache_ttl_secs);
    info!(
        "Ranking cache initialized (ttl {}s)",
        config.ranking_cache_ttl_secs
    );

    // S3 / MinIO for research snapshots
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let llm = LlmClient::new(config.openai_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let news = Arc::new(TavilyClient::new(config.tavily_api_key.clone())?);

    let state = AppState {
        db,
        ranking_cache,
        s3,
        llm,
        news,
        config: config.clone(),
    };

    // TODO: restrict CORS origins once the web client has a fixed domain.
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "bond-static",
    );

    let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets under the path, not as subdomains
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
