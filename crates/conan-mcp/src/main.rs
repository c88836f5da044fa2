//! Conan MCP Server
//!
//! A Model Context Protocol server that exposes Conan package manager
//! operations to agentic IDEs.
//!
//! # Usage
//!
//! ```bash
//! conan-mcp [--config <file>] [--conan <path>] [--work-dir <dir>] [--timeout <secs>]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Control log verbosity (default: `conan_mcp=info`)
//! - `CONAN_MCP_CONFIG`: Path to a TOML config file
//!
//! # Protocol
//!
//! The server communicates via JSON-RPC 2.0 over stdio:
//! - Requests/responses go through stdout
//! - Logs go to stderr (to avoid interfering with the protocol)

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use conan_mcp::server::conan_from_config;
use conan_mcp::{McpServer, ServerConfig};
use tracing_subscriber::EnvFilter;

/// MCP server for the Conan package manager
#[derive(Parser)]
#[command(name = "conan-mcp")]
#[command(about = "MCP server for the Conan package manager")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "CONAN_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the conan executable
    #[arg(long)]
    conan: Option<PathBuf>,

    /// Directory relative paths are resolved against
    #[arg(short, long)]
    work_dir: Option<PathBuf>,

    /// Timeout in seconds for each conan invocation
    #[arg(long)]
    timeout: Option<u64>,
}

impl Args {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(conan) = self.conan {
            config.conan_path = Some(conan);
        }
        if let Some(work_dir) = self.work_dir {
            config.work_dir = Some(work_dir);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = Some(timeout);
        }
        config
    }
}

fn init_logging(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match &config.log_filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::from_default_env().add_directive("conan_mcp=info".parse()?),
    };

    // stdout is reserved for the protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = ServerConfig::discover(args.config.as_deref())?;
    let config = args.apply(config);

    init_logging(&config)?;

    tracing::info!(
        work_dir = ?config.work_dir,
        timeout_secs = ?config.timeout_secs,
        "Starting conan-mcp server"
    );

    let conan = Arc::new(conan_from_config(&config)?);
    match conan.version().await {
        Ok(version) => tracing::info!(%version, "Found conan"),
        Err(e) => tracing::warn!(error = %e, "Could not determine conan version"),
    }

    let server = McpServer::with_conan(conan)?;
    server.run_stdio().await?;

    Ok(())
}
