use chrono::{DateTime, Utc};
use database::PostStore;
use pulse_core::CoreError;
use std::time::Duration;
use tracing::debug;

/// Records newer than this suppress a new collection run.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh { count: i64 },
    Stale,
}

#[derive(Debug, Clone)]
pub struct FreshnessGate {
    store: PostStore,
}

impl FreshnessGate {
    pub fn new(store: PostStore) -> Self {
        Self { store }
    }

    pub async fn check(&self, keyword: &str, now: DateTime<Utc>) -> Result<Freshness, CoreError> {
        let since = now - chrono::Duration::seconds(FRESHNESS_WINDOW.as_secs() as i64);
        let count = self.store.count_since(keyword, since).await?;
        debug!("{} records for '{}' since {}", count, keyword, since);

        Ok(if count > 0 {
            Freshness::Fresh { count }
        } else {
            Freshness::Stale
        })
    }
}
