//! Stlscope MCP Server Binary
//!
//! Runs the Stlscope MCP server on stdio transport, allowing AI agents to
//! load, arrange, render and measure STL models.
//!
//! ## Usage
//!
//! Run directly:
//! ```bash
//! stlscope-mcp --width 1280 --height 720
//! ```
//!
//! Or add to Claude Desktop's MCP configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "stlscope": {
//!       "command": "stlscope-mcp"
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use stlscope_mcp::StlscopeMcpService;
use stlscope_mcp::config::load_config;
use stlscope_mcp::state::SessionHandle;

#[derive(Parser)]
#[command(name = "stlscope-mcp")]
#[command(author, version, about = "MCP server for viewing and measuring STL models")]
struct Args {
    /// Config file (default: {config_dir}/stlscope/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Default screenshot width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Default screenshot height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "stlscope_mcp=trace")
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render_width = width;
    }
    if let Some(height) = args.height {
        config.render_height = height;
    }
    if let Some(filter) = args.log {
        config.log_filter = filter;
    }
    config.validate()?;

    // CRITICAL: Log to stderr only - stdout is reserved for MCP JSON-RPC
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    eprintln!("Stlscope MCP server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        width = config.render_width,
        height = config.render_height,
        show_axes = config.show_axes,
        "Loaded configuration"
    );

    let session = SessionHandle::new(config);

    eprintln!("Ready. Listening on stdio...");

    // Create service and serve on stdio transport
    let service = StlscopeMcpService::new(session);
    let server = service.serve(stdio()).await?;

    // Wait for client to disconnect or error
    server.waiting().await?;

    eprintln!("Client disconnected. Shutting down.");
    Ok(())
}
