//! Read-side aggregation over stored posts: label rollups, trending tokens,
//! per-day history and the recent-post listing.
//!
//! Every query takes an optional keyword filter. Filters are trimmed and
//! lower-cased; a blank filter selects every record. Empty result sets
//! produce zeroed reports, never errors.

pub mod report;
pub mod transforms;

pub use report::*;
pub use transforms::{bucket_by_day, percentage, rank_trends, relative_time};

use chrono::{DateTime, Utc};
use database::PostStore;
use pulse_core::{keyword_filter, normalize_keyword, CoreError};
use tracing::{debug, info};


pub const DEFAULT_TREND_LIMIT: usize = 10;
pub const DEFAULT_LISTING_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct Analytics {
    store: PostStore,
}

impl Analytics {
    pub fn new(store: PostStore) -> Self {
        Self { store }
    }

    pub async fn sentiment_stats(&self, keyword: Option<&str>) -> Result<SentimentStats, CoreError> {
        let keyword = keyword_filter(keyword);
        let counts = self.store.sentiment_counts(keyword.as_deref()).await?;
        let total = counts.total();

        Ok(SentimentStats {
            total,
            positive: counts.positive,
            negative: counts.negative,
            neutral: counts.neutral,
            positive_pct: percentage(counts.positive, total),
            negative_pct: percentage(counts.negative, total),
            neutral_pct: percentage(counts.neutral, total),
            keyword,
        })
    }

    pub async fn trends(&self, keyword: Option<&str>, limit: usize) -> Result<TrendReport, CoreError> {
        let records = self.store.fetch(keyword).await?;
        let report = rank_trends(records.iter().map(|record| record.text.as_str()), limit);
        debug!(
            "Ranked {} tokens from {} records",
            report.total,
            records.len()
        );
        Ok(report)
    }

    pub async fn timeline(&self, keyword: Option<&str>) -> Result<Timeline, CoreError> {
        let keyword = keyword_filter(keyword);
        let records = self.store.fetch(keyword.as_deref()).await?;
        Ok(Timeline {
            timeline: bucket_by_day(&records),
            keyword,
        })
    }

    pub async fn recent_posts(
        &self,
        keyword: Option<&str>,
        limit: usize,
    ) -> Result<PostListing, CoreError> {
        self.recent_posts_at(keyword, limit, Utc::now()).await
    }

    /// Newest `limit` records, with ages measured from `now`.
    pub async fn recent_posts_at(
        &self,
        keyword: Option<&str>,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<PostListing, CoreError> {
        let keyword = keyword_filter(keyword);
        let records = self.store.recent(keyword.as_deref(), limit).await?;
        let posts: Vec<PostSummary> = records
            .iter()
            .map(|record| transforms::summarize(record, now))
            .collect();

        Ok(PostListing {
            count: posts.len(),
            posts,
            keyword,
        })
    }

    pub async fn keyword_status(&self, keyword: &str) -> Result<KeywordStatus, CoreError> {
        let keyword = normalize_keyword(keyword);
        let summary = self.store.keyword_status(&keyword).await?;

        Ok(KeywordStatus {
            keyword,
            exists: summary.count > 0,
            count: summary.count,
            last_update: summary.last_update,
        })
    }

    pub async fn stored_keywords(&self) -> Result<StoredKeywords, CoreError> {
        let stored_keywords = self.store.keyword_counts().await?;
        Ok(StoredKeywords {
            total_keywords: stored_keywords.len(),
            stored_keywords,
        })
    }

    pub async fn clear(&self) -> Result<u64, CoreError> {
        let deleted = self.store.clear().await?;
        info!("Removed {} stored posts", deleted);
        Ok(deleted)
    }
}
