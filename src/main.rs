//! SolarEdge MCP server over stdio.
//!
//! # Usage
//!
//! ```bash
//! # Credentials from the environment or a .env file
//! SOLAREDGE_API_KEY=xxx SOLAREDGE_SITE_ID=123456 solaredge-mcp
//!
//! # Or as flags
//! solaredge-mcp --api-key xxx --site-id 123456
//!
//! # More logging, on stderr
//! RUST_LOG=debug solaredge-mcp
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use executor_core::tokio::TokioGlobal;
use solaredge_mcp::{Cli, SolarTools, server_info};
use solaredge_mcp_rpc::McpServer;
use solaredge_mcp_rpc::transport::stdio;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from elsewhere.
    dotenvy::dotenv().ok();

    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Cli::parse().into_config()?;

    info!("SolarEdge MCP Server running on stdio");
    info!("Using API key: {}", config.masked_api_key());
    info!("Using site ID: {}", config.site_id);
    info!("Using base URL: {}", config.base_url);

    let client = config.client().context("failed to create HTTP client")?;
    let server = McpServer::new(SolarTools::new(client), server_info(), TokioGlobal);

    let (reader, writer) = stdio(config.framer());
    server.serve(reader, writer).await?;

    Ok(())
}
