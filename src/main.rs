//! MCP Server Entry Point
//!
//! Initializes logging, reads configuration from environment variables
//! (see `core::config`), registers the tools, and starts the selected
//! transport. Logs go to stderr; in STDIO mode stdout carries only the
//! JSON-RPC stream.
//!
//! - `RUST_LOG`: log verbosity (default: `demo_mcp_server=info`)

use demo_mcp_server::core::config::{ServerConfig, TransportMode};
use demo_mcp_server::core::server::{self, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("demo_mcp_server=info,actix_web=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let registry = server::initialize_tools(&config);

    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(AppState::from(&config), registry).await,
        TransportMode::Http => server::run_server_http(&config, registry).await,
        TransportMode::Both => {
            // STDIO in the background so MCP Inspector and HTTP clients can
            // use the same process
            let state = AppState::from(&config);
            let stdio_registry = registry.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(state, stdio_registry).await {
                    tracing::error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(&config, registry).await;

            // If HTTP server exits, abort STDIO task
            stdio_handle.abort();

            http_result
        }
    }
}
