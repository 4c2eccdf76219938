//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the shared search engine.
use std::sync::Arc;

use crate::tools::search::{SearchParams, search_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use search_core::{SearchEngine, SearchOptions};

/// The main MCP server handler for mcp-search.
#[derive(Clone)]
pub struct McpSearchServer {
    tool_router: ToolRouter<Self>,
    engine: Arc<SearchEngine>,
    defaults: SearchOptions,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl McpSearchServer {
    /// Create a new server handler around a shared engine.
    pub fn new(engine: Arc<SearchEngine>, defaults: SearchOptions) -> Self {
        Self { tool_router: Self::tool_router(), engine, defaults }
    }

    /// Search the web.
    ///
    /// Serves cached results when allowed, otherwise queries the provider with
    /// throttling and retries. Returns structured JSON or a no-results message.
    #[tool(description = "Search the web and return up-to-date results as structured JSON (title, url, description).")]
    async fn search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.engine, self.defaults, params.0).await
    }
}

impl ServerHandler for McpSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-search".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Provides a web search tool for LLMs and agents to retrieve up-to-date web results as structured JSON."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
