//! Cache keys for search requests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifies one request shape: query text, description flag and result count.
///
/// Requests that differ in any component are distinct entries; a cached
/// entry for 10 results never answers a request for 5.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub query: String,
    pub include_descriptions: bool,
    pub num_results: u8,
}

impl CacheKey {
    pub fn new(query: impl Into<String>, include_descriptions: bool, num_results: u8) -> Self {
        Self { query: query.into(), include_descriptions, num_results }
    }

    /// Stable SHA-256 digest of the key, used as the row id.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.query.as_bytes());
        hasher.update(b"\n");
        hasher.update(if self.include_descriptions { b"1" } else { b"0" });
        hasher.update(b"\n");
        hasher.update(self.num_results.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}
