use analytics::Analytics;
use anyhow::Result;
use background_service::{
    CollectionQueue, CollectionService, Collector, CommunityMap, FreshnessGate,
};
use database::PostStore;
use pulse_core::AppConfig;
use reddit_client::{RedditClient, RedditClientConfig};
use sentiment_engine::SentimentClassifier;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use web::{build_router, AppState};

const DEFAULT_LOG_FILTER: &str = "pulse=info,background_service=info,reddit_client=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("Starting Pulse sentiment service");

    let config_path = std::env::var("PULSE_CONFIG").ok().map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    config.validate()?;

    let store = PostStore::connect(&config.database.url).await?;
    store.run_migrations().await?;

    let reddit = RedditClient::new(RedditClientConfig::from(&config.reddit))?;
    let collector = Collector::new(
        Arc::new(reddit),
        store.clone(),
        SentimentClassifier::new(),
        CommunityMap::with_overrides(&config.communities),
    );

    let queue = Arc::new(CollectionQueue::start(
        Arc::new(collector),
        config.collection.workers,
    ));
    let collection = Arc::new(CollectionService::new(
        FreshnessGate::new(store.clone()),
        queue.clone(),
    ));

    let app = build_router(AppState {
        collection,
        analytics: Analytics::new(store),
        default_limit: config.collection.default_limit,
    });

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Waiting for in-flight collection runs");
    queue.shutdown().await;
    queue.join().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for shutdown signal: {}", e);
    }
}
