//! gltfjsx MCP Server - Model Context Protocol server for GLTF/GLB to JSX conversion
//!
//! This crate exposes the `gltfjsx-core` engine to AI agents as MCP tools:
//!
//! - `gltfjsx` - Convert a model file into a React Three Fiber component
//! - `get-model-structure` - Inspect a model's object hierarchy as JSON
//! - `debug` - Report the server's working directory
//!
//! ## Call flow
//!
//! 1. [`registry`] validates the arguments against the tool's schema
//! 2. [`guard`] reads the model file
//! 3. [`loader`] or [`structure`] decodes it through the engine
//! 4. [`generate`] runs the generator with its output [`suppress`]ed
//! 5. [`response`] shapes the outcome, success or failure

pub mod activity_log;
pub mod generate;
pub mod guard;
pub mod loader;
pub mod registry;
pub mod response;
pub mod schema;
pub mod state;
pub mod structure;
pub mod suppress;
pub mod tools;

mod error;

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    RoleServer,
    ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
        ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use serde_json::{Map, Value};

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use response::{ContentBlock, ToolResponse};
pub use state::ServerState;

// Re-export for binary
pub use rmcp;

/// The gltfjsx MCP service
///
/// Tools are declared as data in a [`ToolRegistry`], so `list_tools` and
/// `call_tool` are implemented directly rather than through generated routing.
#[derive(Clone)]
pub struct GltfjsxMcpService {
    state: ServerState,
    registry: Arc<ToolRegistry>,
}

impl GltfjsxMcpService {
    /// Create a new MCP service with the given state
    pub fn new(state: ServerState) -> Self {
        Self {
            state,
            registry: Arc::new(ToolRegistry::new()),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Run a tool call outside the protocol
    pub async fn call(&self, name: &str, arguments: Option<Map<String, Value>>) -> ToolResponse {
        self.registry.dispatch(&self.state, name, arguments).await
    }
}

impl ServerHandler for GltfjsxMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gltfjsx-mcp".to_string(),
                title: Some("GLTF to React Three Fiber".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: Some("https://github.com/noahsabaj/gltfjsx-mcp".to_string()),
            },
            instructions: Some(
                "gltfjsx MCP server for turning GLTF/GLB models into React Three Fiber components. \
                 \n\nWorkflow:\n\
                 1. get-model-structure(modelPath) - Inspect the model's hierarchy\n\
                 2. gltfjsx(modelPath, options) - Generate the JSX component\n\
                 3. Follow the implementation instructions returned with the code\n\n\
                 Model paths must be absolute. Use debug() to see the server's working directory."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.registry.mcp_tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call(&request.name, request.arguments).await.into())
    }
}
