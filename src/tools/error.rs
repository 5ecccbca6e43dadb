//! Errors raised by tool calls.

use solaredge_api::TransportError;
use thiserror::Error;

/// Failure of a tool call. The display text is what the client sees.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name exists.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The arguments did not match what the tool expects.
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments {
        /// Tool that rejected the arguments.
        tool: &'static str,
        /// What was wrong.
        message: String,
    },

    /// The service answered with a document of an unexpected shape.
    #[error("Unexpected {operation} response: {detail}")]
    UnexpectedResponse {
        /// Operation that produced the document.
        operation: &'static str,
        /// What was missing or malformed.
        detail: String,
    },

    /// A date range could not be rendered.
    #[error("Failed to format date range: {0}")]
    Format(#[from] time::error::Format),

    /// The remote call failed.
    #[error(transparent)]
    Remote(#[from] TransportError),
}
