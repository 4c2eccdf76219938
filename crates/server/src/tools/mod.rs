//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mcp-search server.

pub mod search;

pub use search::{SearchOutput, SearchParams};
