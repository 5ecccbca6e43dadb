//! The capability tool handlers call into.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::{RemoteOperation, TransportError};

/// Performs remote operations for one configured site.
///
/// Implementations must be shareable across tasks: tool calls run
/// concurrently and may issue several operations at once.
pub trait RemoteAdapter: Send + Sync + 'static {
    /// Perform `operation` and return the parsed JSON body.
    fn call(
        &self,
        operation: RemoteOperation,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

impl<A: RemoteAdapter> RemoteAdapter for Arc<A> {
    fn call(
        &self,
        operation: RemoteOperation,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        (**self).call(operation)
    }
}
