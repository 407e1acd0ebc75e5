//! Reddit content source: app-only OAuth2, rate limited and retried listing
//! calls, exposed through [`pulse_core::ContentSource`].

pub mod api;
pub mod auth;
pub mod rate_limiter;
pub mod retry;


use api::{RedditApiClient, RedditListing, RedditPostData, MAX_PAGE_SIZE, REDDIT_API_BASE};
use async_trait::async_trait;
use auth::{AppOnlyAuth, REDDIT_TOKEN_URL};
use pulse_core::{
    ContentSource, CoreError, RawPost, RedditApiError, RedditConfig, TimeWindow, PLATFORM_REDDIT,
};
use rate_limiter::RateLimitConfig;
use reqwest::Client;
use retry::{RetryConfig, RetryExecutor};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub use api::status_error;

#[derive(Debug, Clone)]
pub struct RedditClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub api_base: String,
    pub token_url: String,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
}

impl RedditClientConfig {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
            api_base: REDDIT_API_BASE.to_string(),
            token_url: REDDIT_TOKEN_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::reddit(),
            rate_limit: RateLimitConfig::reddit_oauth(),
        }
    }

    /// Points the client at other hosts, e.g. a local mock server.
    pub fn with_endpoints(mut self, api_base: &str, token_url: &str) -> Self {
        self.api_base = api_base.to_string();
        self.token_url = token_url.to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl From<&RedditConfig> for RedditClientConfig {
    fn from(config: &RedditConfig) -> Self {
        Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.user_agent.clone(),
        )
    }
}

#[derive(Debug)]
pub struct RedditClient {
    auth: AppOnlyAuth,
    api: RedditApiClient,
    retry: RetryExecutor,
}

impl RedditClient {
    pub fn new(config: RedditClientConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;

        let api_base = Url::parse(&config.api_base).map_err(|e| {
            CoreError::Config(pulse_core::ConfigError::InvalidValue {
                field: "reddit.api_base".to_string(),
                value: format!("{} ({})", config.api_base, e),
            })
        })?;

        let auth = AppOnlyAuth::new(
            &config.client_id,
            &config.client_secret,
            &config.token_url,
            http_client.clone(),
        )?;

        Ok(Self {
            auth,
            api: RedditApiClient::new(http_client, api_base, config.rate_limit),
            retry: RetryExecutor::new(config.retry),
        })
    }

    /// Site-wide search, following `after` cursors until `limit` posts were
    /// returned or the listing runs out.
    pub async fn search_posts(
        &self,
        keyword: &str,
        limit: usize,
        window: TimeWindow,
    ) -> Result<Vec<RawPost>, CoreError> {
        let api = &self.api;
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        while posts.len() < limit {
            let page_size = (limit - posts.len()).min(MAX_PAGE_SIZE);
            let cursor = after.as_deref();

            let listing = self
                .authorized("search", move |token| async move {
                    api.search_page(&token, keyword, window, page_size, cursor)
                        .await
                })
                .await?;

            let next_page = listing.next_page().map(str::to_string);
            let page = listing.into_posts();
            debug!(
                "Search page for '{}' ({}) returned {} posts",
                keyword,
                window,
                page.len()
            );

            let exhausted = page.is_empty();
            posts.extend(page);
            match next_page {
                Some(next) if !exhausted => after = Some(next),
                _ => break,
            }
        }

        posts.truncate(limit);
        info!(
            "Search for '{}' over the last {} returned {} posts",
            keyword,
            window,
            posts.len()
        );
        Ok(posts)
    }

    pub async fn hot_posts(&self, subreddit: &str, limit: usize) -> Result<Vec<RawPost>, CoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let api = &self.api;
        let listing = self
            .authorized("hot", move |token| async move { api.hot(&token, subreddit, limit).await })
            .await?;

        let mut posts = listing.into_posts();
        posts.truncate(limit);
        info!("Retrieved {} hot posts from r/{}", posts.len(), subreddit);
        Ok(posts)
    }

    /// Runs `request` with a valid token under the retry policy. A rejected
    /// token is dropped and the request repeated once with a fresh one.
    async fn authorized<F, Fut>(
        &self,
        operation: &str,
        request: F,
    ) -> Result<RedditListing<RedditPostData>, CoreError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<RedditListing<RedditPostData>, CoreError>>,
    {
        let auth = &self.auth;
        let request = &request;

        self.retry
            .execute(operation, move || async move {
                let token = auth.access_token().await?;
                match request(token).await {
                    Err(CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                        debug!("Access token rejected, exchanging a new one");
                        auth.invalidate().await;
                        let token = auth.access_token().await?;
                        request(token).await
                    }
                    other => other,
                }
            })
            .await
    }
}

#[async_trait]
impl ContentSource for RedditClient {
    fn platform(&self) -> &str {
        PLATFORM_REDDIT
    }

    async fn search(
        &self,
        keyword: &str,
        limit: usize,
        window: TimeWindow,
    ) -> Result<Vec<RawPost>, CoreError> {
        self.search_posts(keyword, limit, window).await
    }

    async fn list_hot(&self, community: &str, limit: usize) -> Result<Vec<RawPost>, CoreError> {
        self.hot_posts(community, limit).await
    }
}
