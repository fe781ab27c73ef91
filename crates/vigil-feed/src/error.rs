//! Error types for the alert feed.

use thiserror::Error;

/// Alert feed errors.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Backend returned a non-2xx status (transient, retryable)
    #[error("Backend error (transient): {0}")]
    BackendTransient(String),

    /// Backend returned a non-2xx status (permanent)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Request timed out
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Response body did not decode as an alert fragment
    #[error("Invalid fragment payload: {0}")]
    InvalidFragment(String),

    /// Acknowledge was rejected by the backend
    #[error("Acknowledgement failed: {0}")]
    AcknowledgeRejected(String),

    /// Comment submission was rejected by the backend
    #[error("Comment rejected: {0}")]
    CommentRejected(String),
}

impl FeedError {
    /// Check if this error is transient (the poll cycle keeps retrying
    /// either way, but transient errors back off rather than alarm).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FeedError::BackendTransient(_)
                | FeedError::Timeout(_)
                | FeedError::ConnectionFailed(_)
        )
    }

    /// Check if this error is network-related.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            FeedError::Timeout(_) | FeedError::ConnectionFailed(_)
        )
    }

    /// Get a short message suitable for the status banner.
    pub fn banner_message(&self) -> String {
        match self {
            FeedError::Timeout(secs) => format!("request timed out after {secs}s"),
            FeedError::ConnectionFailed(msg) => format!("connection failed: {msg}"),
            FeedError::BackendTransient(msg) | FeedError::Backend(msg) => msg.clone(),
            FeedError::InvalidFragment(msg) => format!("bad response: {msg}"),
            other => other.to_string(),
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    pub fn from_http_status(status: u16, body: &str) -> Self {
        match status {
            408 | 429 | 500 | 502 | 503 | 504 => {
                FeedError::BackendTransient(format!("HTTP {status}: {body}"))
            }
            _ => FeedError::Backend(format!("HTTP {status}: {body}")),
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // The configured timeout is not recoverable from the error
            // itself; the client reports it alongside.
            FeedError::ConnectionFailed(format!("timed out: {e}"))
        } else if e.is_connect() {
            FeedError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            FeedError::InvalidFragment(e.to_string())
        } else {
            FeedError::BackendTransient(e.to_string())
        }
    }
}

/// Result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
