//! Error types for remote calls.

use thiserror::Error;

/// Failure of a single remote operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with a non-success status.
    #[error("API request failed: {status} {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Reason phrase of the status, possibly empty.
        reason: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("Request failed: {0}")]
    Network(String),

    /// The body was not valid JSON.
    #[error("Request failed: invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    /// Wrap an HTTP client error.
    ///
    /// The request URL is stripped first since it carries the API key.
    #[must_use]
    pub fn network(error: reqwest::Error) -> Self {
        let error = error.without_url();
        let mut message = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Network(message)
    }
}
