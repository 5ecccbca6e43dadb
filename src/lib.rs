//! # SolarEdge MCP server
//!
//! Exposes the SolarEdge monitoring API as a fixed set of MCP tools that an
//! agent can list and call over stdio.
//!
//! The protocol side lives in `solaredge-mcp-rpc` and the HTTP side in
//! `solaredge-api`. This crate ties them together:
//!
//! - [`tools`]: the tool catalogue, argument handling and the daily
//!   performance analysis.
//! - [`config`]: command line and environment configuration.
//!
//! ```ignore
//! use executor_core::tokio::TokioGlobal;
//! use solaredge_mcp::{SolarTools, server_info};
//! use solaredge_mcp_rpc::McpServer;
//! use solaredge_mcp_rpc::transport::stdio;
//!
//! let client = config.client()?;
//! let server = McpServer::new(SolarTools::new(client), server_info(), TokioGlobal);
//! let (reader, writer) = stdio(config.framer());
//! server.serve(reader, writer).await?;
//! ```

pub mod config;
pub mod tools;

pub use config::{Cli, Config, ConfigError, mask_api_key};
pub use tools::{SolarTools, ToolError, ToolName, ToolRegistry};

use solaredge_mcp_rpc::ServerInfo;

/// Name reported by `initialize`.
pub const SERVER_NAME: &str = "solar-edge-mcp";

/// Version reported by `initialize`.
pub const SERVER_VERSION: &str = "1.0.0";

/// Identity reported by `initialize`.
#[must_use]
pub fn server_info() -> ServerInfo {
    ServerInfo::new(SERVER_NAME, SERVER_VERSION)
}
