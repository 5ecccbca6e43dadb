//! The seam between the protocol layer and the tools it serves.

use std::future::Future;

use serde_json::Value;

use crate::protocol::ToolDescriptor;

/// A fixed catalogue of tools the dispatcher can list and call.
///
/// Implementations report failures with their own error type; the dispatcher
/// turns any such failure into an internal-error response carrying the
/// error's display text, so tools never deal with JSON-RPC codes.
pub trait ToolService: Send + Sync + 'static {
    /// Error raised by a tool call.
    type Error: std::error::Error + Send;

    /// Every tool, in advertisement order.
    fn definitions(&self) -> &[ToolDescriptor];

    /// Call a tool by name with a JSON object of arguments.
    fn call(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;
}
