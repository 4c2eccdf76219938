//! Brave Search API request types and validation.

use search_core::{ProviderRequest, SafeSearch};
use serde::Serialize;

use crate::brave::BraveError;

/// Maximum results Brave returns per request.
pub const MAX_COUNT: u8 = 20;

/// Longest query Brave accepts, in bytes.
pub const MAX_QUERY_CHARS: usize = 400;

/// Most whitespace-separated words Brave accepts in a query.
pub const MAX_QUERY_WORDS: usize = 50;

/// Search request parameters for Brave Web Search API.
///
/// Based on Brave Web Search API documentation:
/// https://api-dashboard.search.brave.com/app/documentation/web-search/get-started
#[derive(Debug, Clone, Serialize, Default)]
pub struct SearchRequest {
    /// Search query (required, max 400 chars / 50 words).
    pub q: String,

    /// Number of results (1-20, default 20).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u8>,

    /// Safe search: off|moderate|strict (default moderate).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safesearch: Option<SafeSearch>,

    /// Whether snippets carry highlight markup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decorations: Option<bool>,
}

impl From<&ProviderRequest> for SearchRequest {
    /// Build the wire request for one engine attempt.
    ///
    /// The count is clamped into Brave's accepted range and decorations are
    /// disabled so descriptions come back as plain text.
    fn from(req: &ProviderRequest) -> Self {
        SearchRequest {
            q: req.query.clone(),
            count: Some(req.count.clamp(1, MAX_COUNT)),
            safesearch: Some(req.safe_search),
            text_decorations: Some(false),
        }
    }
}

impl SearchRequest {
    /// Validate the search request parameters.
    ///
    /// Returns an error if any parameters are out of range or malformed.
    pub fn validate(&self) -> Result<(), BraveError> {
        if self.q.trim().is_empty() {
            return Err(BraveError::InvalidQuery("query cannot be empty".to_string()));
        }

        if self.q.len() > MAX_QUERY_CHARS {
            return Err(BraveError::InvalidQuery(format!(
                "query too long: {} chars (max {MAX_QUERY_CHARS})",
                self.q.len()
            )));
        }

        let word_count = self.q.split_whitespace().count();
        if word_count > MAX_QUERY_WORDS {
            return Err(BraveError::InvalidQuery(format!(
                "query too long: {word_count} words (max {MAX_QUERY_WORDS})"
            )));
        }

        if let Some(count) = self.count
            && !(1..=MAX_COUNT).contains(&count)
        {
            return Err(BraveError::InvalidCount);
        }

        Ok(())
    }

    /// Get the effective count (default 20).
    pub fn get_count(&self) -> u8 {
        self.count.unwrap_or(MAX_COUNT)
    }
}
