//! MCP server handler implementation.
//!
//! This module defines the host bridge that routes tool calls to worker
//! events and reports the effects back to the caller.
use std::sync::Arc;

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

use crate::controller::Worker;
use crate::tools::{
    self, CacheGetParams, CacheStoresParams, NotificationClickParams, PushParams, SwFetchParams, SwMessageParams, SyncParams,
};

/// The MCP server handler for pulse-sw.
#[derive(Clone)]
pub struct PulseServer {
    worker: Arc<Worker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl PulseServer {
    /// Create a new server handler around a shared worker.
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Run the install event: precache the manifest into the current versioned store. Activates immediately on success."
    )]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        tools::install_impl(&self.worker).await
    }

    #[tool(description = "Run the activate event: delete stale cache stores and claim clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        tools::activate_impl(&self.worker).await
    }

    #[tool(
        description = "Send a page fetch through the worker. Returns the strategy used and the response, or reports pass-through."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        tools::fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a message to the worker: SKIP_WAITING, CACHE_URLS, CLEAR_CACHE or GET_VERSION.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        tools::message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push payload. Returns the notification the worker would show.")]
    async fn sw_push(&self, params: Parameters<PushParams>) -> Result<CallToolResult, McpError> {
        tools::push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Fire a background sync. Fails when the sync delegate fails so the caller can retry.")]
    async fn sw_sync(&self, params: Parameters<SyncParams>) -> Result<CallToolResult, McpError> {
        tools::sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a notification click. The 'open' action opens the app root.")]
    async fn sw_notification_click(
        &self, params: Parameters<NotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        tools::notification_click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Look up the current store's cached entry for a URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        tools::get_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache stores with entry counts, optionally with each store's entry URLs.")]
    async fn cache_stores(&self, params: Parameters<CacheStoresParams>) -> Result<CallToolResult, McpError> {
        tools::stores_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for PulseServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "pulse-sw".into(),
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
