//! Error types for the coordinator client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the coordinator
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed at the transport level (includes timeouts)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Coordinator returned an error status code
    #[error("coordinator error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body text
        message: String,
    },

    /// The sentinel 404 response meaning the coordinator has no work queued
    #[error("no batches available")]
    NoBatches,

    /// Failed to parse a response body
    #[error("failed to parse response: {0}")]
    ParseError(String),
}

impl ClientError {
    /// Create an API error from status code and body text
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is the "no batches available" sentinel
    pub fn is_no_batches(&self) -> bool {
        matches!(self, Self::NoBatches)
    }

    /// Check if this error is a request timeout
    ///
    /// The poll loop treats timeouts differently from other transport
    /// errors (immediate retry instead of a delay).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestFailed(e) if e.is_timeout())
    }
}
