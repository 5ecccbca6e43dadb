//! MCP server: request dispatch and the serving loop.

mod dispatcher;
mod server;
mod service;

pub use dispatcher::{DispatchError, Dispatcher, INITIALIZED_NOTIFICATION, Step, ToolCall};
pub use server::McpServer;
pub use service::ToolService;
