//! Error types for memtui
//!
//! Every fallible operation in the core crate returns [`MemtuiError`].
//! Uses `thiserror` for ergonomic error definitions.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// User-visible text for a rejected compare-and-swap.
pub const CAS_CONFLICT_MESSAGE: &str =
    "CAS conflict: value was modified by another client. Please reload and try again.";

/// Main error type for memtui operations
#[derive(Error, Debug)]
pub enum MemtuiError {
    /// Could not reach or probe the server
    #[error("Connection error: {0}")]
    Connection(String),

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Server closed the connection mid-exchange
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Malformed or unexpected reply
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// `ERROR`, `CLIENT_ERROR` or `SERVER_ERROR` reply
    #[error("Server error: {0}")]
    Server(String),

    /// Key does not exist
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Item changed since the CAS token was issued
    #[error("{}", CAS_CONFLICT_MESSAGE)]
    CasConflict,

    /// Deadline elapsed before the operation finished
    #[error("Operation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Cancelled through a [`crate::cancel::CancelToken`]
    #[error("Operation cancelled")]
    Cancelled,

    /// Key name rejected before reaching the server
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// No client is available for the operation
    #[error("Not connected")]
    NotConnected,

    /// Configuration parsing or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parse or encode error
    #[error("JSON error: {0}")]
    Json(String),

    /// Internal error (e.g. a panicking task)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for memtui operations
pub type Result<T> = std::result::Result<T, MemtuiError>;

impl MemtuiError {
    /// Returns true if this error means the server is unusable
    #[cold]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MemtuiError::Connection(_)
                | MemtuiError::Io(_)
                | MemtuiError::ConnectionClosed
                | MemtuiError::NotConnected
        )
    }

    /// Returns true for a compare-and-swap rejection
    pub fn is_cas_conflict(&self) -> bool {
        matches!(self, MemtuiError::CasConflict)
    }

    /// Returns true when the key was missing on the server
    pub fn is_not_found(&self) -> bool {
        matches!(self, MemtuiError::KeyNotFound(_))
    }

    /// Returns true when the operation was aborted by its caller
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MemtuiError::Cancelled)
    }
}

impl From<serde_json::Error> for MemtuiError {
    fn from(e: serde_json::Error) -> Self {
        MemtuiError::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_fatal() {
        assert!(MemtuiError::ConnectionClosed.is_fatal());
        assert!(MemtuiError::Connection("refused".to_string()).is_fatal());
        assert!(MemtuiError::NotConnected.is_fatal());
        assert!(!MemtuiError::CasConflict.is_fatal());
        assert!(!MemtuiError::KeyNotFound("k".to_string()).is_fatal());
        assert!(!MemtuiError::Timeout(Duration::from_secs(10)).is_fatal());
    }

    #[test]
    fn test_cas_conflict_message() {
        assert_eq!(MemtuiError::CasConflict.to_string(), CAS_CONFLICT_MESSAGE);
        assert!(MemtuiError::CasConflict.is_cas_conflict());
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            MemtuiError::Timeout(Duration::from_secs(30)).to_string(),
            "Operation timed out after 30s"
        );
    }
}
