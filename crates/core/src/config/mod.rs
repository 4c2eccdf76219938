//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MCP_SEARCH_*)
//! 2. TOML config file (if MCP_SEARCH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::backoff::BackoffPolicy;
use crate::engine::{EngineSettings, SearchOptions};
use crate::provider::SafeSearch;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MCP_SEARCH_*)
/// 2. TOML config file (if MCP_SEARCH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite search cache. The parent directory is created on
    /// startup and `<cache_path>.lock` guards flushes.
    ///
    /// Set via MCP_SEARCH_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Base delay between provider calls, in seconds.
    ///
    /// Set via MCP_SEARCH_REQUEST_DELAY_SECS environment variable.
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,

    /// Upper bound on the random jitter added before each provider call.
    ///
    /// Set via MCP_SEARCH_JITTER_MS environment variable.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Maximum provider attempts per search.
    ///
    /// Set via MCP_SEARCH_MAX_RETRIES environment variable.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Result count used when a caller does not ask for one.
    ///
    /// Set via MCP_SEARCH_NUM_RESULTS environment variable.
    #[serde(default = "default_num_results")]
    pub num_results: u8,

    /// Whether callers read from the cache unless they say otherwise.
    ///
    /// Set via MCP_SEARCH_USE_CACHE environment variable.
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Whether results carry titles and descriptions unless callers say otherwise.
    ///
    /// Set via MCP_SEARCH_INCLUDE_DESCRIPTIONS environment variable.
    #[serde(default = "default_true")]
    pub include_descriptions: bool,

    /// Searches allowed to run at once.
    ///
    /// Set via MCP_SEARCH_MAX_CONCURRENT_SEARCHES environment variable.
    #[serde(default = "default_max_concurrent_searches")]
    pub max_concurrent_searches: usize,

    /// Provider HTTP request timeout in milliseconds.
    ///
    /// Set via MCP_SEARCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Brave API subscription token.
    ///
    /// Set via MCP_SEARCH_BRAVE_API_KEY environment variable.
    #[serde(default)]
    pub brave_api_key: Option<String>,

    /// Address for the HTTP health endpoint; disabled when unset.
    ///
    /// Set via MCP_SEARCH_HEALTH_ADDR environment variable (e.g. "127.0.0.1:8080").
    #[serde(default)]
    pub health_addr: Option<SocketAddr>,

    /// How long shutdown may take before outstanding work is abandoned.
    ///
    /// Set via MCP_SEARCH_SHUTDOWN_TIMEOUT_MS environment variable.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// How long a flush waits for `<cache_path>.lock` before giving up.
    ///
    /// Set via MCP_SEARCH_LOCK_TIMEOUT_MS environment variable.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Provider safe search level: "off", "moderate" or "strict".
    ///
    /// Set via MCP_SEARCH_SAFE_SEARCH environment variable.
    #[serde(default)]
    pub safe_search: SafeSearch,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("cache/search_cache.sqlite")
}

fn default_request_delay_secs() -> u64 {
    5
}

fn default_jitter_ms() -> u64 {
    2_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_num_results() -> u8 {
    5
}

fn default_max_concurrent_searches() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_shutdown_timeout_ms() -> u64 {
    5_000
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            request_delay_secs: default_request_delay_secs(),
            jitter_ms: default_jitter_ms(),
            max_retries: default_max_retries(),
            num_results: default_num_results(),
            use_cache: true,
            include_descriptions: true,
            max_concurrent_searches: default_max_concurrent_searches(),
            timeout_ms: default_timeout_ms(),
            brave_api_key: None,
            health_addr: None,
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
            safe_search: SafeSearch::Off,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(self.request_delay_secs), Duration::from_millis(self.jitter_ms))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            max_retries: self.max_retries,
            backoff: self.backoff(),
            max_concurrent: self.max_concurrent_searches,
            safe_search: self.safe_search,
        }
    }

    /// Options applied when a caller leaves them unspecified.
    pub fn default_options(&self) -> SearchOptions {
        SearchOptions {
            num_results: self.num_results,
            use_cache: self.use_cache,
            include_descriptions: self.include_descriptions,
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MCP_SEARCH_`
    /// 2. TOML file from `MCP_SEARCH_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MCP_SEARCH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MCP_SEARCH_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if Brave API key is available.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the Brave API key is not set.
    pub fn require_brave_api_key(&self) -> Result<&str, ConfigError> {
        self.brave_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "brave_api_key".into(),
                hint: "Set MCP_SEARCH_BRAVE_API_KEY environment variable".into(),
            })
    }
}
