//! Collection side of the pipeline: the fetch cascade, the freshness gate in
//! front of it and the worker pool that runs it off the request path.

pub mod collector;
pub mod communities;
pub mod freshness;
pub mod queue;

pub use collector::{CollectionReport, Collector, Stage, StageOutcome, HOT_LISTING_LIMIT};
pub use communities::{CommunityMap, DEFAULT_COMMUNITIES};
pub use freshness::{Freshness, FreshnessGate, FRESHNESS_WINDOW};
pub use queue::{CollectionJob, CollectionQueue};

use chrono::{DateTime, Utc};
use pulse_core::{normalize_keyword, CoreError};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub keyword: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// Recent records exist; nothing was queued.
    Cached { keyword: String, count: i64 },
    /// A collection job was queued.
    Started { keyword: String },
}

/// Entry point for analyze requests: consults the freshness gate and queues a
/// collection run when the keyword is stale.
///
/// Two concurrent requests for the same stale keyword may both queue a run.
pub struct CollectionService {
    gate: FreshnessGate,
    queue: Arc<CollectionQueue>,
}

impl CollectionService {
    pub fn new(gate: FreshnessGate, queue: Arc<CollectionQueue>) -> Self {
        Self { gate, queue }
    }

    pub async fn request(&self, request: AnalyzeRequest) -> Result<AnalyzeOutcome, CoreError> {
        self.request_at(request, Utc::now()).await
    }

    pub async fn request_at(
        &self,
        request: AnalyzeRequest,
        now: DateTime<Utc>,
    ) -> Result<AnalyzeOutcome, CoreError> {
        let keyword = normalize_keyword(&request.keyword);
        if keyword.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "keyword must not be empty".to_string(),
            });
        }
        if request.limit == 0 {
            return Err(CoreError::InvalidInput {
                message: "limit must be at least 1".to_string(),
            });
        }

        if let Freshness::Fresh { count } = self.gate.check(&keyword, now).await? {
            info!("Using {} recent records for '{}'", count, keyword);
            return Ok(AnalyzeOutcome::Cached { keyword, count });
        }

        self.queue
            .enqueue(CollectionJob {
                keyword: keyword.clone(),
                limit: request.limit,
            })
            .await?;
        info!("Started collection for '{}'", keyword);
        Ok(AnalyzeOutcome::Started { keyword })
    }

    pub fn queue(&self) -> &Arc<CollectionQueue> {
        &self.queue
    }
}
