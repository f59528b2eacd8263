//! Unified error types for swproxy.
//!
//! Storage and configuration failures are folded into [`Error`]. Network
//! failures keep their own [`NetworkError`] type because the executor hands
//! them back to callers untouched.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the proxy engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown destination).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be parsed or resolved against the origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("STORAGE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Network failure that no fallback could absorb.
    #[error("NETWORK_ERROR: {0}")]
    Network(#[from] NetworkError),

    /// One or more essential URLs could not be cached at install time.
    #[error("MANIFEST_INCOMPLETE: {failed} of {total} essential urls failed")]
    ManifestIncomplete { failed: usize, total: usize },
}

/// Failure reported by a network fetcher.
///
/// The executor never rewrites these; a bypassed request sees exactly what
/// the fetcher produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("offline: {0}")]
    Offline(String),

    #[error("dns lookup failed: {0}")]
    Dns(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("response too large: {0}")]
    TooLarge(String),

    #[error("network error: {0}")]
    Other(String),
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

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::CorruptEntry(msg) => (-32002, msg.clone()),
            Error::Network(e) => (-32008, e.to_string()),
            Error::ManifestIncomplete { .. } => (-32013, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUrl("ftp://app.test/logo.png".to_string());
        assert!(err.to_string().contains("INVALID_URL"));
        assert!(err.to_string().contains("logo.png"));
    }

    #[test]
    fn test_network_error_wraps() {
        let err: Error = NetworkError::Offline("no route".into()).into();
        assert_eq!(err.to_string(), "NETWORK_ERROR: offline: no route");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err: Error = NetworkError::Timeout("https://app.test/app.js".into()).into();
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32008);

        let err = Error::ManifestIncomplete { failed: 2, total: 7 };
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32013);
        assert!(mcp_err.message.contains("2 of 7"));
    }
}
