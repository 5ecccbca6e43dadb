//! # MCP (Model Context Protocol) server plumbing
//!
//! This crate serves a fixed catalogue of tools to an MCP client over a
//! newline-delimited JSON-RPC 2.0 stream, usually the process's stdin and
//! stdout.
//!
//! ## Overview
//!
//! - [`transport`] frames incoming bytes into lines and writes one JSON
//!   document per response line.
//! - [`server::Dispatcher`] validates each message and routes `initialize`,
//!   `tools/list` and `tools/call`.
//! - [`McpServer`] runs every request on its own task and funnels responses
//!   back through a single writer.
//!
//! Tools are supplied through the [`ToolService`] trait:
//!
//! ```ignore
//! use executor_core::tokio::TokioGlobal;
//! use solaredge_mcp_rpc::{McpServer, ServerInfo};
//! use solaredge_mcp_rpc::transport::{LineFramer, stdio};
//!
//! let server = McpServer::new(my_tools, ServerInfo::new("my-server", "1.0.0"), TokioGlobal);
//! let (reader, writer) = stdio(LineFramer::default());
//! server.serve(reader, writer).await?;
//! ```
//!
//! ## Error Handling
//!
//! Failures inside a request never stop the server; they become JSON-RPC
//! error responses. [`McpError`] is only returned when the transport itself
//! breaks.

pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{
    CallToolResult, Content, InputSchema, JsonRpcError, McpError, PropertySchema, ServerInfo,
    ToolDescriptor,
};
pub use server::{McpServer, ToolService};
