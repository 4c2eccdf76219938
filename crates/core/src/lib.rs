//! Core types and shared functionality for mcp-search.
//!
//! This crate provides:
//! - Durable search-result cache with SQLite backend
//! - Backoff and client-identity rotation for provider retries
//! - The cache-and-retry search engine
//! - Unified error types
//! - Configuration structures

pub mod backoff;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod provider;
pub mod record;

pub use backoff::BackoffPolicy;
pub use cache::{CacheDb, CacheKey};
pub use config::{AppConfig, ConfigError};
pub use engine::{EngineSettings, SearchEngine, SearchOptions};
pub use error::Error;
pub use identity::IdentityRotator;
pub use provider::{ProviderError, ProviderRequest, SafeSearch, SearchProvider};
pub use record::{RawHit, ResultRecord};
