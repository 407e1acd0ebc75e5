use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use pulse_core::{CoreError, RawPost, RedditApiError, TimeWindow, UNKNOWN_AUTHOR};
use reqwest::{header::HeaderMap, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Largest page the listing endpoints return.
pub const MAX_PAGE_SIZE: usize = 100;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// The subset of a submission the collector needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub created_utc: f64,
}

impl From<RedditPostData> for RawPost {
    fn from(post_data: RedditPostData) -> Self {
        let author = post_data
            .author
            .filter(|name| !name.is_empty() && name != UNKNOWN_AUTHOR);

        Self {
            title: post_data.title,
            body: post_data.selftext,
            author,
        }
    }
}

impl RedditListing<RedditPostData> {
    /// Cursor for the next page, if the listing has one.
    pub fn next_page(&self) -> Option<&str> {
        self.data.after.as_deref().filter(|after| !after.is_empty())
    }

    pub fn into_posts(self) -> Vec<RawPost> {
        self.data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect()
    }
}

/// Maps a non-success status to the error the rest of the system reasons about.
pub fn status_error(
    status: StatusCode,
    headers: &HeaderMap,
    endpoint: &str,
    subreddit: &str,
) -> CoreError {
    let error = match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = headers
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<f64>().ok())
                .map(|seconds| seconds.ceil().max(0.0) as u64)
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!("Rate limited on {}, retry after {} seconds", endpoint, retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        StatusCode::UNAUTHORIZED => RedditApiError::InvalidToken,
        StatusCode::FORBIDDEN => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        StatusCode::NOT_FOUND => RedditApiError::SubredditNotFound {
            subreddit: subreddit.to_string(),
        },
        status if status.is_server_error() => RedditApiError::ServerError {
            status_code: status.as_u16(),
        },
        status => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", status, endpoint),
        },
    };
    CoreError::RedditApi(error)
}

/// Authenticated listing calls against the OAuth API host.
#[derive(Debug, Clone)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    api_base: Url,
}

impl RedditApiClient {
    pub fn new(http_client: Client, api_base: Url, rate_limit: RateLimitConfig) -> Self {
        Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(rate_limit)),
            api_base,
        }
    }

    pub async fn make_request(
        &self,
        endpoint: &str,
        subreddit: &str,
        access_token: &str,
        query_params: &[(&str, String)],
    ) -> Result<Response, CoreError> {
        let url = self.api_base.join(endpoint).map_err(|e| CoreError::InvalidInput {
            message: format!("Invalid endpoint {}: {}", endpoint, e),
        })?;

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for GET {} after {:?}",
            endpoint, permit.queue_wait_time
        );

        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .query(query_params)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for GET {}: {}", endpoint, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            Ok(response)
        } else {
            error!("Request failed with status: {} for {}", status, endpoint);
            Err(status_error(status, response.headers(), endpoint, subreddit))
        }
    }

    /// One page of `/r/all/search` results.
    pub async fn search_page(
        &self,
        access_token: &str,
        keyword: &str,
        window: TimeWindow,
        limit: usize,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let mut params = vec![
            ("q", keyword.to_string()),
            ("t", window.as_str().to_string()),
            ("sort", "relevance".to_string()),
            ("restrict_sr", "false".to_string()),
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(after) = after {
            params.push(("after", after.to_string()));
        }

        let response = self
            .make_request("/r/all/search", "all", access_token, &params)
            .await?;
        parse_listing(response, "/r/all/search").await
    }

    pub async fn hot(
        &self,
        access_token: &str,
        subreddit: &str,
        limit: usize,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/hot", subreddit);
        let params = [
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("raw_json", "1".to_string()),
        ];

        let response = self
            .make_request(&endpoint, subreddit, access_token, &params)
            .await?;
        parse_listing(response, &endpoint).await
    }
}

async fn parse_listing<T: DeserializeOwned>(
    response: Response,
    endpoint: &str,
) -> Result<RedditListing<T>, CoreError> {
    response.json().await.map_err(|e| {
        error!("Failed to parse listing from {}: {}", endpoint, e);
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: format!("Failed to parse listing from {}", endpoint),
        })
    })
}
