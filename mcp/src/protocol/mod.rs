//! MCP protocol types and JSON-RPC message definitions.

mod error;
mod message;
mod types;

pub use error::{ErrorCode, JsonRpcError, McpError};
pub use message::{JSONRPC_VERSION, JsonRpcRequest, JsonRpcResponse, RequestId};
pub use types::{
    CallToolResult, Content, InitializeResult, InputSchema, ListToolsResult, PROTOCOL_VERSION,
    PropertySchema, PropertyType, ServerCapabilities, ServerInfo, TextContent, ToolDescriptor,
    ToolsCapability,
};
