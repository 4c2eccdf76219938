//! search tool implementation.
//!
//! Validates the agent's parameters, fills in configured defaults, and hands
//! the request to the shared engine.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use search_client::{MAX_COUNT, MAX_QUERY_CHARS, MAX_QUERY_WORDS};
use search_core::{Error, ResultRecord, SearchEngine, SearchOptions};

/// Input parameters for the search tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// The search query to execute (at most 400 characters and 50 words).
    pub query: String,

    /// Number of search results to return (1-20, server default 5).
    #[serde(default)]
    #[schemars(range(min = 1, max = 20))]
    pub num_results: Option<u32>,

    /// Whether to use cached results if available (server default true).
    #[serde(default)]
    pub use_cache: Option<bool>,

    /// Whether to include titles and descriptions in results (server default true).
    #[serde(default)]
    pub include_descriptions: Option<bool>,
}

impl SearchParams {
    /// Check bounds and fill unset options from `defaults`.
    pub fn resolve(&self, defaults: SearchOptions) -> Result<SearchOptions, Error> {
        if self.query.trim().is_empty() {
            return Err(Error::InvalidInput("query cannot be empty".into()));
        }

        if self.query.len() > MAX_QUERY_CHARS {
            return Err(Error::InvalidInput(format!(
                "query too long: {} chars (max {MAX_QUERY_CHARS})",
                self.query.len()
            )));
        }

        let words = self.query.split_whitespace().count();
        if words > MAX_QUERY_WORDS {
            return Err(Error::InvalidInput(format!("query too long: {words} words (max {MAX_QUERY_WORDS})")));
        }

        let num_results = match self.num_results.map(u8::try_from) {
            None => defaults.num_results,
            Some(Ok(n)) if (1..=MAX_COUNT).contains(&n) => n,
            Some(_) => {
                return Err(Error::InvalidInput(format!(
                    "num_results must be between 1 and {MAX_COUNT}, got {}",
                    self.num_results.unwrap_or_default()
                )));
            }
        };

        Ok(SearchOptions {
            num_results,
            use_cache: self.use_cache.unwrap_or(defaults.use_cache),
            include_descriptions: self.include_descriptions.unwrap_or(defaults.include_descriptions),
        })
    }
}

/// Output structure for the search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchOutput {
    /// The query as received.
    pub query: String,
    /// Number of results returned.
    pub total_results: usize,
    /// The search results, best first.
    pub results: Vec<SearchHit>,
}

/// Individual search result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl From<&ResultRecord> for SearchHit {
    fn from(record: &ResultRecord) -> Self {
        Self {
            title: record.title().to_string(),
            url: record.url().to_string(),
            description: record.description().to_string(),
        }
    }
}

/// Implementation of the search tool.
pub async fn search_impl(
    engine: &SearchEngine, defaults: SearchOptions, params: SearchParams,
) -> Result<CallToolResult, McpError> {
    let options = params.resolve(defaults)?;
    let records = engine.search(&params.query, options).await;

    if records.is_empty() {
        return Ok(CallToolResult::success(vec![Content::text(format!(
            "No results found for query: {}",
            params.query
        ))]));
    }

    let output = SearchOutput {
        query: params.query,
        total_results: records.len(),
        results: records.iter().map(SearchHit::from).collect(),
    };

    let json = serde_json::to_string_pretty(&output).map_err(render_error)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn render_error(err: serde_json::Error) -> Error {
    Error::Internal(format!("failed to serialize results: {err}"))
}
