//! MCP server handler implementation.
//!
//! This module defines the server handler that routes tool calls to the shell service.
use std::sync::Arc;

use crate::tools::cache::generations::generations_impl;
use crate::tools::cache::get::{CacheGetParams, get_impl};
use crate::tools::lifecycle::{activate_impl, install_impl};
use crate::tools::shell_fetch::{ShellFetchParams, fetch_impl};

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
use shellcache_client::ShellService;

/// The MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    tool_router: ToolRouter<Self>,
    service: Arc<ShellService>,
}

#[tool_router]
impl ShellCacheServer {
    pub fn new(service: Arc<ShellService>) -> Self {
        Self { tool_router: Self::tool_router(), service }
    }

    /// Fetch a URL through the caching engine.
    ///
    /// The request is routed by host to a cache strategy. Requests outside the configured routes,
    /// and every request before activation, go straight to the network.
    #[tool(
        description = "Fetch a URL through the offline cache. API hosts are network-first, CDN hosts stale-while-revalidate, and the app origin cache-first."
    )]
    async fn shell_fetch(&self, params: Parameters<ShellFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.service, params.0).await
    }

    #[tool(description = "Download the shell manifest into a fresh cache generation. All-or-nothing.")]
    async fn shell_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.service).await
    }

    #[tool(
        description = "Activate the installed generation: delete every other generation and start serving requests from it."
    )]
    async fn shell_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.service).await
    }

    /// Read a stored entry without touching the network.
    #[tool(description = "Read a cached GET response from the active generation. Never makes a network request.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.service, params.0).await
    }

    #[tool(description = "List cache generations along with the current and active generation names.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.service).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
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
