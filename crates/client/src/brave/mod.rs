//! Brave Search API provider.
//!
//! Implements the engine's [`SearchProvider`] seam on top of the Brave Web
//! Search API.
//!
//! ### Specification
//!
//! - **Endpoint**: `https://api.search.brave.com/res/v1/web/search`
//! - **Authentication**: Uses `X-Subscription-Token` header.
//! - **Identity**: Sends the user-agent chosen by the engine for each attempt.
//! - **Rate Limiting**: HTTP 429 becomes `ProviderError::RateLimited` carrying
//!   the `Retry-After` hint. The client never retries; the engine does.

pub mod error;
pub mod request;
pub mod response;

pub use error::BraveError;
pub use request::SearchRequest;
pub use response::BraveApiResponse;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap};
use search_core::{ProviderError, ProviderRequest, RawHit, SearchProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Default base URL for Brave Search API.
const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Brave API client configuration.
#[derive(Debug, Clone)]
pub struct BraveConfig {
    /// API key (MCP_SEARCH_BRAVE_API_KEY).
    pub api_key: String,
    /// Base URL (default: https://api.search.brave.com/res/v1).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self { api_key: String::new(), base_url: DEFAULT_BASE_URL.to_string(), timeout: DEFAULT_TIMEOUT }
    }
}

/// Brave Search API client.
#[derive(Debug, Clone)]
pub struct BraveClient {
    http: reqwest::Client,
    config: BraveConfig,
    endpoint: Url,
}

impl BraveClient {
    /// Create a new Brave client with the given configuration.
    pub fn new(config: BraveConfig) -> Result<Self, BraveError> {
        if config.api_key.is_empty() {
            return Err(BraveError::MissingApiKey);
        }

        let endpoint = Url::parse(&format!("{}/web/search", config.base_url.trim_end_matches('/')))
            .map_err(|e| BraveError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BraveError::Network(Arc::new(e)))?;

        Ok(Self { http, config, endpoint })
    }

    /// Execute one web search with the given client identity.
    pub async fn web_search(&self, req: &SearchRequest, user_agent: &str) -> Result<BraveApiResponse, BraveError> {
        req.validate()?;

        let start = Instant::now();
        tracing::debug!(query = %req.q, count = req.get_count(), "searching Brave API");

        let http_response = self
            .http
            .get(self.endpoint.clone())
            .header("X-Subscription-Token", &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, user_agent)
            .query(req)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!(status = %status, "Brave API response status");

        if status == 401 || status == 403 {
            return Err(BraveError::AuthError);
        }

        if status == 429 {
            return Err(BraveError::RateLimited { retry_after: parse_retry_after(http_response.headers()) });
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(BraveError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let api_response: BraveApiResponse =
            serde_json::from_slice(&bytes).map_err(|e| BraveError::Parse(e.to_string()))?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            results = api_response.web.as_ref().map(|w| w.results.len()).unwrap_or(0),
            more = api_response.has_more(),
            "Brave search completed"
        );

        Ok(api_response)
    }
}

#[async_trait]
impl SearchProvider for BraveClient {
    async fn search(&self, request: &ProviderRequest) -> Result<Vec<RawHit>, ProviderError> {
        let req = SearchRequest::from(request);
        let response = self.web_search(&req, &request.user_agent).await?;
        Ok(response.into_hits(request.want_descriptions))
    }
}

/// Read a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are ignored; the engine's own backoff applies then.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
