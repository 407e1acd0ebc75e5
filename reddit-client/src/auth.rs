use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError, TokenResponse,
    TokenUrl,
};
use pulse_core::{CoreError, RedditApiError};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are renewed this long before they actually expire.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub secret: String,
    pub expires_at: Instant,
}

impl AccessToken {
    pub fn new(secret: String, expires_in: Duration, issued_at: Instant) -> Self {
        Self {
            secret,
            expires_at: issued_at + expires_in,
        }
    }

    pub fn is_usable_at(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// App-only OAuth2 (client credentials grant). The current token is cached
/// and exchanged again shortly before it expires.
#[derive(Debug)]
pub struct AppOnlyAuth {
    oauth_client: BasicClient,
    http_client: Client,
    cached: Mutex<Option<AccessToken>>,
}

impl AppOnlyAuth {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        token_url: &str,
        http_client: Client,
    ) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(invalid_url)?;
        let token_url = TokenUrl::new(token_url.to_string()).map_err(invalid_url)?;

        let oauth_client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            oauth_client,
            http_client,
            cached: Mutex::new(None),
        })
    }

    pub async fn access_token(&self) -> Result<String, CoreError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_usable_at(Instant::now())) {
            return Ok(token.secret.clone());
        }

        let token = self.exchange().await?;
        let secret = token.secret.clone();
        *cached = Some(token);
        Ok(secret)
    }

    /// Drops the cached token so the next call performs a fresh exchange.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    async fn exchange(&self) -> Result<AccessToken, CoreError> {
        debug!("Requesting app-only access token");
        let issued_at = Instant::now();
        let http_client = &self.http_client;

        let response = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http_client, request))
            .await
            .map_err(|e| match e {
                RequestTokenError::Request(e) => CoreError::Network(e),
                RequestTokenError::ServerResponse(response) => {
                    CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                        reason: response.to_string(),
                    })
                }
                other => CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: other.to_string(),
                }),
            })?;

        let expires_in = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        info!("Obtained access token valid for {:?}", expires_in);

        Ok(AccessToken::new(
            response.access_token().secret().to_string(),
            expires_in,
            issued_at,
        ))
    }
}

/// Sends the token exchange through the shared client so it carries the
/// configured user agent and timeout.
async fn send_token_request(
    http_client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url)
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

fn invalid_url(e: url::ParseError) -> CoreError {
    CoreError::Config(pulse_core::ConfigError::InvalidValue {
        field: "reddit.token_url".to_string(),
        value: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usable_until_refresh_margin() {
        let now = Instant::now();
        let token = AccessToken::new("abc".to_string(), Duration::from_secs(3600), now);
        assert!(token.is_usable_at(now));
        assert!(token.is_usable_at(now + Duration::from_secs(3500)));
        assert!(!token.is_usable_at(now + Duration::from_secs(3541)));
    }

    #[test]
    fn test_short_lived_token_is_never_usable() {
        let now = Instant::now();
        let token = AccessToken::new("abc".to_string(), Duration::from_secs(30), now);
        assert!(!token.is_usable_at(now));
    }

    #[test]
    fn test_rejects_malformed_token_url() {
        let result = AppOnlyAuth::new("id", "secret", "not a url", Client::new());
        assert!(matches!(result, Err(CoreError::Config(_))));
    }
}
