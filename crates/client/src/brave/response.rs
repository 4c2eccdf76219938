//! Brave Search API response types.
//!
//! Every per-result field is optional here; the engine decides what a
//! usable hit is.

use search_core::RawHit;
use serde::Deserialize;

/// Raw response from Brave Web Search API.
#[derive(Debug, Deserialize)]
pub struct BraveApiResponse {
    #[serde(default)]
    pub query: Option<QueryInfo>,
    #[serde(default)]
    pub web: Option<WebResults>,
}

/// Query metadata from Brave response.
#[derive(Debug, Deserialize)]
pub struct QueryInfo {
    pub original: String,
    #[serde(default)]
    #[serde(alias = "moreResultsAvailable")]
    pub more_results_available: bool,
}

/// Web search results container.
#[derive(Debug, Deserialize)]
pub struct WebResults {
    #[serde(default)]
    pub results: Vec<WebResult>,
}

/// Individual web search result from Brave.
#[derive(Debug, Deserialize)]
pub struct WebResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl BraveApiResponse {
    /// Hits in rank order, with descriptions dropped unless wanted.
    pub fn into_hits(self, want_descriptions: bool) -> Vec<RawHit> {
        self.web
            .map(|w| {
                w.results
                    .into_iter()
                    .map(|r| RawHit {
                        url: r.url,
                        title: r.title,
                        description: if want_descriptions { r.description } else { None },
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether Brave reports more results past this page.
    pub fn has_more(&self) -> bool {
        self.query.as_ref().is_some_and(|q| q.more_results_available)
    }
}
