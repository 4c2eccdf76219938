//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_path` is empty
    /// - `max_retries` is outside 1..=10
    /// - `num_results` is outside 1..=20
    /// - `request_delay_secs` exceeds 5 minutes or `jitter_ms` exceeds 1 minute
    /// - `max_concurrent_searches` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `lock_timeout_ms` exceeds 1 minute
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_path".into(), reason: "must not be empty".into() });
        }

        if !(1..=10).contains(&self.max_retries) {
            return Err(ConfigError::Invalid { field: "max_retries".into(), reason: "must be between 1 and 10".into() });
        }

        if !(1..=20).contains(&self.num_results) {
            return Err(ConfigError::Invalid { field: "num_results".into(), reason: "must be between 1 and 20".into() });
        }

        if self.request_delay_secs > 300 {
            return Err(ConfigError::Invalid {
                field: "request_delay_secs".into(),
                reason: "must not exceed 5 minutes (300s)".into(),
            });
        }

        if self.jitter_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "jitter_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.max_concurrent_searches == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrent_searches".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.lock_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "lock_timeout_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.request_delay_secs == 0 && self.jitter_ms == 0 {
            tracing::warn!("request_delay_secs and jitter_ms are both 0; provider calls are not throttled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_cache_path() {
        let config = AppConfig { cache_path: PathBuf::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_path"));
    }

    #[test]
    fn test_validate_max_retries_bounds() {
        let config = AppConfig { max_retries: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_retries"));

        let config = AppConfig { max_retries: 11, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_retries"));
    }

    #[test]
    fn test_validate_num_results_bounds() {
        let config = AppConfig { num_results: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "num_results"));

        let config = AppConfig { num_results: 21, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "num_results"));
    }

    #[test]
    fn test_validate_request_delay_too_large() {
        let config = AppConfig { request_delay_secs: 301, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "request_delay_secs"));
    }

    #[test]
    fn test_validate_jitter_too_large() {
        let config = AppConfig { jitter_ms: 60_001, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "jitter_ms"));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = AppConfig { max_concurrent_searches: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_concurrent_searches"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_lock_timeout_too_large() {
        let config = AppConfig { lock_timeout_ms: 60_001, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "lock_timeout_ms"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            max_retries: 1,
            num_results: 20,
            request_delay_secs: 0,
            jitter_ms: 0,
            max_concurrent_searches: 1,
            timeout_ms: 100,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
