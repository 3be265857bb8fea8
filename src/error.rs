//! Error types for recurly-pager
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for recurly-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP {status}: {body}")]
    Transport {
        /// Response status code
        status: u16,
        /// Response body, as received
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Page Errors
    // ============================================================================
    #[error("Failed to deserialize page: {message}")]
    Deserialization { message: String },

    #[error("Protocol violation: {message}")]
    Protocol { message: String },

    #[error("Page fetch cancelled")]
    Cancelled,

    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error from a non-success response
    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
        }
    }

    /// Create a deserialization error
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from an abandoned async fetch
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Whether repeating the same advance may succeed.
    ///
    /// The pager never retries on its own; this only classifies the failure
    /// for callers that want to.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Transport { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for recurly-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::transport(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::protocol("has_more is true but next is empty");
        assert_eq!(
            err.to_string(),
            "Protocol violation: has_more is true but next is empty"
        );

        let err = Error::unsupported("reset");
        assert_eq!(err.to_string(), "Unsupported operation: reset");

        assert_eq!(Error::Cancelled.to_string(), "Page fetch cancelled");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Cancelled.is_retryable());
        assert!(Error::transport(429, "").is_retryable());
        assert!(Error::transport(500, "").is_retryable());
        assert!(Error::transport(503, "").is_retryable());

        assert!(!Error::transport(400, "").is_retryable());
        assert!(!Error::transport(404, "").is_retryable());
        assert!(!Error::protocol("bad next").is_retryable());
        assert!(!Error::deserialization("bad body").is_retryable());
        assert!(!Error::unsupported("reset").is_retryable());
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::transport(500, "").is_cancelled());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.with_context(|| "outer".to_string());
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
