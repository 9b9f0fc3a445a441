//! Error types for the SAIL source library.
//!
//! The taxonomy mirrors the failure surface of the load and query paths:
//! acquisition (network/auth/missing file), whole-archive parse failures,
//! unknown application labels, and missing object ids. Per-entry parse
//! problems are deliberately *not* errors — they are collected as
//! [`ParseWarning`](crate::archive::ParseWarning)s alongside a successful
//! parse.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for SAIL source operations.
#[derive(Debug, Error)]
pub enum SailError {
    // Acquisition errors: anything that prevents obtaining archive bytes.
    #[error("Acquisition failed: {message}")]
    Acquisition {
        message: String,
        /// Optional cause description (HTTP status, IO detail)
        cause: Option<String>,
    },

    // Archive-level errors: the bytes are not a readable archive at all.
    #[error("Malformed archive: {message}")]
    MalformedArchive { message: String },

    // Store errors
    #[error("Unknown application label: {label}")]
    UnknownApplication { label: String },

    #[error("Object not found: {id}")]
    ObjectNotFound { id: String },

    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // RPC boundary errors
    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for SAIL source operations.
pub type Result<T> = std::result::Result<T, SailError>;

// Conversion implementations for common error types

impl From<std::io::Error> for SailError {
    fn from(err: std::io::Error) -> Self {
        SailError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for SailError {
    fn from(err: serde_json::Error) -> Self {
        SailError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for SailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SailError::Timeout(std::time::Duration::from_secs(0))
        } else {
            SailError::Network {
                message: err.to_string(),
                cause: Some(err.to_string()),
            }
        }
    }
}

impl SailError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        SailError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an acquisition error without a cause.
    pub fn acquisition(message: impl Into<String>) -> Self {
        SailError::Acquisition {
            message: message.into(),
            cause: None,
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Standard JSON-RPC error codes:
    /// - -32602: Invalid params
    /// - -32603: Internal error
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Network/connectivity error
    /// - -32001: Acquisition failed
    /// - -32002: Malformed archive
    /// - -32003: Unknown application label
    /// - -32004: Object not found
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            SailError::Network { .. } | SailError::Timeout(_) => -32000,
            SailError::Acquisition { .. } => -32001,
            SailError::MalformedArchive { .. } => -32002,
            SailError::UnknownApplication { .. } => -32003,
            SailError::ObjectNotFound { .. } => -32004,
            SailError::InvalidParams { .. } => -32602,
            _ => -32603,
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SailError::Network { .. } | SailError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SailError::UnknownApplication {
            label: "hr-portal".into(),
        };
        assert_eq!(err.to_string(), "Unknown application label: hr-portal");
    }

    #[test]
    fn test_rpc_error_codes() {
        assert_eq!(
            SailError::acquisition("export rejected").to_rpc_error_code(),
            -32001
        );
        assert_eq!(
            SailError::ObjectNotFound { id: "_a-1".into() }.to_rpc_error_code(),
            -32004
        );
        assert_eq!(
            SailError::InvalidParams {
                message: "missing label".into()
            }
            .to_rpc_error_code(),
            -32602
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(SailError::Timeout(std::time::Duration::from_secs(5)).is_retryable());
        assert!(!SailError::MalformedArchive {
            message: "not a zip".into()
        }
        .is_retryable());
    }
}
