use analytics::{
    KeywordStatus, PostListing, SentimentStats, StoredKeywords, Timeline, TrendReport,
    DEFAULT_LISTING_LIMIT, DEFAULT_TREND_LIMIT,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use background_service::{AnalyzeOutcome, AnalyzeRequest};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

fn default_platform() -> String {
    "reddit".to_string()
}

fn default_timeframe() -> String {
    "24h".to_string()
}

/// `platform` and `timeframe` are accepted for compatibility and not used.
#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub keyword: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub keyword: Option<String>,
    pub limit: Option<usize>,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Pulse sentiment API",
        "status": "running",
    }))
}

pub async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> ApiResult<Json<Value>> {
    debug!(
        "Analyze request for '{}' on {} ({})",
        body.keyword, body.platform, body.timeframe
    );

    let outcome = state
        .collection
        .request(AnalyzeRequest {
            keyword: body.keyword,
            limit: body.limit.unwrap_or(state.default_limit),
        })
        .await?;

    let response = match outcome {
        AnalyzeOutcome::Cached { keyword, count } => json!({
            "status": "cached",
            "message": format!("Using existing data for '{}' ({} posts)", keyword, count),
            "keyword": keyword,
            "count": count,
        }),
        AnalyzeOutcome::Started { keyword } => json!({
            "status": "started",
            "message": format!("Collecting posts for '{}'", keyword),
            "keyword": keyword,
        }),
    };
    Ok(Json(response))
}

pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> ApiResult<Json<SentimentStats>> {
    let stats = state
        .analytics
        .sentiment_stats(query.keyword.as_deref())
        .await?;
    Ok(Json(stats))
}

pub async fn posts(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<PostListing>> {
    let listing = state
        .analytics
        .recent_posts(
            query.keyword.as_deref(),
            query.limit.unwrap_or(DEFAULT_LISTING_LIMIT),
        )
        .await?;
    Ok(Json(listing))
}

pub async fn trends(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<TrendReport>> {
    let report = state
        .analytics
        .trends(
            query.keyword.as_deref(),
            query.limit.unwrap_or(DEFAULT_TREND_LIMIT),
        )
        .await?;
    Ok(Json(report))
}

pub async fn timeline(
    State(state): State<AppState>,
    Query(query): Query<KeywordQuery>,
) -> ApiResult<Json<Timeline>> {
    let timeline = state.analytics.timeline(query.keyword.as_deref()).await?;
    Ok(Json(timeline))
}

pub async fn clear(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let deleted = state.analytics.clear().await?;
    Ok(Json(json!({
        "message": "All data cleared",
        "deleted": deleted,
    })))
}

pub async fn status(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> ApiResult<Json<KeywordStatus>> {
    let status = state.analytics.keyword_status(&keyword).await?;
    Ok(Json(status))
}

pub async fn stored_keywords(State(state): State<AppState>) -> ApiResult<Json<StoredKeywords>> {
    Ok(Json(state.analytics.stored_keywords().await?))
}
