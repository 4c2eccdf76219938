//! The external search provider seam.

use crate::record::RawHit;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Safe search filtering levels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    #[default]
    Off,
    Moderate,
    Strict,
}

/// One provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub query: String,
    /// Upper bound on hits wanted.
    pub count: u8,
    pub safe_search: SafeSearch,
    pub want_descriptions: bool,
    /// Client identity to present for this call.
    pub user_agent: String,
}

/// Provider failures, split by how the engine retries them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider is throttling us. `retry_after` is its hint, if any.
    #[error("rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    /// Anything else: network, HTTP status, malformed response.
    #[error("provider request failed: {0}")]
    Failed(String),
}

/// A web search backend.
///
/// Returns hits in provider rank order. Implementations should not retry
/// internally; the engine owns retry and backoff.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &ProviderRequest) -> Result<Vec<RawHit>, ProviderError>;
}
