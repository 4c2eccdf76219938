//! SQLite-backed cache for search results.
//!
//! This module provides a persistent cache keyed by request shape using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Keys derived from (query, description flag, result count)
//! - Automatic schema migrations
//! - WAL mode so independent processes can open the same file
//! - Buffered writes flushed under a cross-process advisory lock

pub mod connection;
pub mod key;
pub mod lock;
pub mod migrations;
pub mod search;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::CacheKey;
