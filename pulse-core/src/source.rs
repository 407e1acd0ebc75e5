use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::{RawPost, TimeWindow};

/// An external platform that posts can be collected from.
///
/// Implementations are expected to be unreliable: any call may fail because of
/// rate limiting, network trouble or a missing community, and callers treat a
/// failure as "no posts from this attempt".
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Origin identifier stored on every record collected from this source.
    fn platform(&self) -> &str;

    /// Searches the whole platform for `keyword`, restricted to `window`.
    /// May return fewer than `limit` posts.
    async fn search(
        &self,
        keyword: &str,
        limit: usize,
        window: TimeWindow,
    ) -> Result<Vec<RawPost>, CoreError>;

    /// Lists currently popular posts of a community, unfiltered.
    async fn list_hot(&self, community: &str, limit: usize) -> Result<Vec<RawPost>, CoreError>;
}
