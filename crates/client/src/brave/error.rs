//! Brave API client error types.

use search_core::ProviderError;
use std::sync::Arc;
use std::time::Duration;

/// Errors from Brave Search API client.
#[derive(Debug, thiserror::Error)]
pub enum BraveError {
    /// Missing API key.
    #[error("missing API key: MCP_SEARCH_BRAVE_API_KEY not set")]
    MissingApiKey,

    /// Base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// Invalid search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid count parameter (must be 1-20).
    #[error("invalid count: must be 1-20")]
    InvalidCount,

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Rate limited by Brave API.
    #[error("rate limited: too many requests")]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for BraveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { BraveError::Timeout } else { BraveError::Network(Arc::new(err)) }
    }
}

impl From<BraveError> for ProviderError {
    fn from(err: BraveError) -> Self {
        match err {
            BraveError::RateLimited { retry_after } => ProviderError::RateLimited { retry_after },
            other => ProviderError::Failed(other.to_string()),
        }
    }
}
