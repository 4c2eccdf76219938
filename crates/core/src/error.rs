//! Unified error types for mcp-search.
//!
//! Each variant renders with a stable `CODE:` prefix so log lines and tool
//! errors can be matched without parsing the message.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the mcp-search server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The cache file or its directory could not be opened.
    #[error("CACHE_UNAVAILABLE: {0}")]
    StoreUnavailable(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The advisory lock guarding flushes could not be taken.
    #[error("CACHE_LOCK_FAILED: {0}")]
    LockFailed(String),

    /// A cached entry could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// A server-side fault unrelated to the caller's input.
    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::StoreUnavailable(msg) => (-32001, msg.clone()),
            Error::LockFailed(msg) => (-32003, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Serialization(msg) => (-32002, msg.clone()),
            Error::Internal(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::StoreUnavailable("cache/search.sqlite".to_string());
        assert!(err.to_string().contains("CACHE_UNAVAILABLE"));
        assert!(err.to_string().contains("cache/search.sqlite"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("query cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_internal_error_is_not_blamed_on_input() {
        let mcp_err: McpError = Error::Internal("encoder failed".into()).into();
        assert_eq!(mcp_err.code.0, -32603);
        assert!(mcp_err.message.contains("encoder failed"));
    }

    #[test]
    fn test_lock_error_code() {
        let mcp_err: McpError = Error::LockFailed("busy".into()).into();
        assert_eq!(mcp_err.code.0, -32003);
    }
}
