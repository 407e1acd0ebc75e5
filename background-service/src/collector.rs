use chrono::Utc;
use database::PostStore;
use pulse_core::{
    is_substantial, normalize_keyword, ContentSource, CoreError, ErrorExt, NewPost, RawPost,
    TimeWindow,
};
use sentiment_engine::SentimentClassifier;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::communities::CommunityMap;

/// Posts requested from each fallback community.
pub const HOT_LISTING_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum Stage {
    Search(TimeWindow),
    Community(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Search(window) => write!(f, "search ({})", window),
            Stage::Community(name) => write!(f, "r/{}", name),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub fetched: usize,
    pub stored: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub keyword: String,
    pub collected: usize,
    pub used_fallback: bool,
    pub stages: Vec<StageOutcome>,
}

/// Runs the fetch cascade for one keyword: site-wide search over widening
/// windows, then the mapped communities' hot listings if search stored nothing.
pub struct Collector {
    source: Arc<dyn ContentSource>,
    store: PostStore,
    classifier: SentimentClassifier,
    communities: CommunityMap,
}

impl Collector {
    pub fn new(
        source: Arc<dyn ContentSource>,
        store: PostStore,
        classifier: SentimentClassifier,
        communities: CommunityMap,
    ) -> Self {
        Self {
            source,
            store,
            classifier,
            communities,
        }
    }

    /// Fails only for a blank keyword; source and store failures are recorded
    /// on the stage they happened in and the cascade moves on.
    pub async fn collect(&self, keyword: &str, limit: usize) -> Result<CollectionReport, CoreError> {
        let keyword = normalize_keyword(keyword);
        if keyword.is_empty() {
            return Err(CoreError::InvalidInput {
                message: "keyword must not be empty".to_string(),
            });
        }

        let mut report = CollectionReport {
            keyword: keyword.clone(),
            collected: 0,
            used_fallback: false,
            stages: Vec::new(),
        };

        for window in TimeWindow::ESCALATION {
            if report.collected >= limit {
                break;
            }
            let remaining = limit - report.collected;
            let fetched = self.source.search(&keyword, remaining, window).await;
            let outcome = self
                .store_stage(Stage::Search(window), &keyword, fetched, remaining, false)
                .await;
            report.collected += outcome.stored;
            report.stages.push(outcome);
        }

        if report.collected == 0 && limit > 0 {
            report.used_fallback = true;
            for community in self.communities.lookup(&keyword) {
                if report.collected >= limit {
                    break;
                }
                let remaining = limit - report.collected;
                let fetched = self.source.list_hot(&community, HOT_LISTING_LIMIT).await;
                let outcome = self
                    .store_stage(Stage::Community(community), &keyword, fetched, remaining, true)
                    .await;
                report.collected += outcome.stored;
                report.stages.push(outcome);
            }
        }

        info!(
            "Total collected for '{}': {} posts{}",
            keyword,
            report.collected,
            if report.used_fallback { " (community fallback)" } else { "" }
        );
        Ok(report)
    }

    async fn store_stage(
        &self,
        stage: Stage,
        keyword: &str,
        fetched: Result<Vec<RawPost>, CoreError>,
        remaining: usize,
        require_mention: bool,
    ) -> StageOutcome {
        let posts = match fetched {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Stage {} failed for '{}': {}", stage, keyword, e);
                return StageOutcome {
                    stage,
                    fetched: 0,
                    stored: 0,
                    error: Some(e.user_friendly_message()),
                };
            }
        };

        let fetched = posts.len();
        let records = self.prepare(&posts, keyword, remaining, require_mention);

        match self.store.insert_batch(&records).await {
            Ok(stored) => {
                info!(
                    "Stage {} stored {} of {} posts for '{}'",
                    stage, stored, fetched, keyword
                );
                StageOutcome {
                    stage,
                    fetched,
                    stored,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Could not store stage {} for '{}': {}", stage, keyword, e);
                StageOutcome {
                    stage,
                    fetched,
                    stored: 0,
                    error: Some(e.user_friendly_message()),
                }
            }
        }
    }

    /// Filters and classifies up to `remaining` posts.
    fn prepare(
        &self,
        posts: &[RawPost],
        keyword: &str,
        remaining: usize,
        require_mention: bool,
    ) -> Vec<NewPost> {
        let platform = self.source.platform();

        posts
            .iter()
            .map(|post| (post, post.text()))
            .filter(|(_, text)| is_substantial(text))
            .filter(|(_, text)| !require_mention || text.to_lowercase().contains(keyword))
            .take(remaining)
            .map(|(post, text)| {
                let classification = self.classifier.classify(&text);
                NewPost::classified(
                    platform,
                    post.author.as_deref(),
                    &text,
                    classification,
                    keyword,
                    Utc::now(),
                )
            })
            .collect()
    }
}
