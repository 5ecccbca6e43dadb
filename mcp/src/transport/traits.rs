//! Transport trait definitions.

use std::future::Future;

use super::framer::Frame;
use crate::protocol::{JsonRpcResponse, McpError};

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Incoming side of a transport: a lazy sequence of framed lines.
///
/// Note: Uses `&mut self` to avoid locks - a source is owned by the single
/// task that drains it.
pub trait MessageSource: Send {
    /// Receive the next framed line.
    ///
    /// Returns `None` once the peer has closed the stream. Implementations must
    /// be cancel-safe: dropping the future loses no buffered input.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Frame>>> + Send;
}

/// Outgoing side of a transport.
pub trait MessageSink: Send {
    /// Write one response as a single line.
    fn send(&mut self, response: &JsonRpcResponse) -> impl Future<Output = Result<()>> + Send;
}
