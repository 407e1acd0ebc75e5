//! HTTP surface: the analyze trigger plus the read-only analytics views.

pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};

use analytics::Analytics;
use axum::{
    routing::{delete, get, post},
    Router,
};
use background_service::CollectionService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub collection: Arc<CollectionService>,
    pub analytics: Analytics,
    /// Used when an analyze request omits `limit`.
    pub default_limit: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/stats", get(handlers::stats))
        .route("/api/posts", get(handlers::posts))
        .route("/api/trends", get(handlers::trends))
        .route("/api/timeline", get(handlers::timeline))
        .route("/api/clear", delete(handlers::clear))
        .route("/api/status/{keyword}", get(handlers::status))
        .route("/api/debug/keywords", get(handlers::stored_keywords))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}
