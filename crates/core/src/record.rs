//! Search result records and their normalization at the provider boundary.

use serde::{Deserialize, Serialize};

/// Placeholder rendered when a hit carries no title.
pub const NO_TITLE: &str = "No title";

/// Placeholder rendered when a hit carries no description.
pub const NO_DESCRIPTION: &str = "No description";

/// A raw hit as handed back by a provider.
///
/// Every field is optional; [`normalize`] decides what survives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl RawHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()), ..Default::default() }
    }

    pub fn with_details(url: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { url: Some(url.into()), title: Some(title.into()), description: Some(description.into()) }
    }
}

/// One search hit as cached and returned to callers.
///
/// URL-only records (descriptions not requested) carry no title or
/// description at all; records fetched with descriptions always carry both,
/// backfilled with placeholders where the provider had nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ResultRecord {
    pub fn url_only(url: impl Into<String>) -> Self {
        Self { url: url.into(), title: None, description: None }
    }

    pub fn new(url: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { url: url.into(), title: Some(title.into()), description: Some(description.into()) }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Title, or the placeholder when none was recorded.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(NO_TITLE)
    }

    /// Description, or the placeholder when none was recorded.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

/// Turn provider hits into result records, preserving provider order.
///
/// Hits without a usable URL are dropped. With `include_descriptions` the
/// missing or blank title/description fields are backfilled; without it only
/// the URL is kept.
pub fn normalize(hits: Vec<RawHit>, include_descriptions: bool) -> Vec<ResultRecord> {
    hits.into_iter()
        .filter_map(|hit| {
            let url = hit.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
            if !include_descriptions {
                return Some(ResultRecord::url_only(url));
            }
            let title = non_blank(hit.title).unwrap_or_else(|| NO_TITLE.to_string());
            let description = non_blank(hit.description).unwrap_or_else(|| NO_DESCRIPTION.to_string());
            Some(ResultRecord::new(url, title, description))
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
