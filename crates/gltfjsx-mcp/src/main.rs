//! gltfjsx MCP Server Binary
//!
//! Runs the gltfjsx MCP server on stdio transport, allowing AI agents to turn
//! GLTF/GLB models into React Three Fiber components.
//!
//! ## Usage
//!
//! Run directly:
//! ```bash
//! gltfjsx-mcp
//! ```
//!
//! Or add to Claude Desktop's MCP configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "gltfjsx": {
//!       "command": "gltfjsx-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing_subscriber::filter::{EnvFilter, filter_fn};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use gltfjsx_mcp::state::ServerState;
use gltfjsx_mcp::{GltfjsxMcpService, suppress};

#[tokio::main]
async fn main() -> Result<()> {
    // CRITICAL: Log to stderr only - stdout is reserved for MCP JSON-RPC.
    // Nothing is logged while the engine runs with its output suppressed.
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_filter(filter_fn(|_| !suppress::is_active()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    suppress::route_console_to_log();

    let state = ServerState::new()?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        working_dir = %state.working_dir().display(),
        "gltfjsx MCP server ready, listening on stdio"
    );

    // Create service and serve on stdio transport
    let service = GltfjsxMcpService::new(state);
    let server = service.serve(stdio()).await?;

    // Wait for client to disconnect or error
    server.waiting().await?;

    tracing::info!("Client disconnected, shutting down");
    Ok(())
}
