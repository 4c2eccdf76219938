//! Search providers for mcp-search.
//!
//! This crate provides the HTTP-backed implementations of the core
//! engine's `SearchProvider` seam.

pub mod brave;

pub use brave::request::{MAX_COUNT, MAX_QUERY_CHARS, MAX_QUERY_WORDS};

pub use brave::{BraveApiResponse, BraveClient, BraveConfig, BraveError, SearchRequest};
