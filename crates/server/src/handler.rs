//! MCP server handler implementation.
//!
//! Each tool delivers one host trigger to the shared router.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, SwMessageParams, SwNotificationClickParams, SwPushParams, activate_impl, click_impl, fetch_impl,
    install_impl, message_impl, namespaces_impl, push_impl, refresh_impl,
};

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
use swproxy_core::{CacheStore, ServiceRouter};

/// The main MCP server handler for swproxy.
#[derive(Clone)]
pub struct SwProxyServer {
    router: Arc<ServiceRouter>,
    store: Arc<dyn CacheStore>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl SwProxyServer {
    pub fn new(router: Arc<ServiceRouter>, store: Arc<dyn CacheStore>) -> Self {
        Self { router, store, tool_router: Self::tool_router() }
    }

    #[tool(description = "Install trigger. Caches the essential URLs into the current namespace and reports failures.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.router).await
    }

    #[tool(description = "Activate trigger. Deletes every cache namespace except the current one, then takes control.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.router).await
    }

    #[tool(
        description = "Fetch trigger. Routes a request through the proxy and returns status, headers, body and whether it came from the network, the cache or a fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.router, params.0).await
    }

    #[tool(description = "Message trigger. SKIP_WAITING activates a waiting install immediately.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.router, params.0).await
    }

    #[tool(description = "Periodic trigger. Re-fetches every cached entry and overwrites it on success.")]
    async fn sw_refresh(&self) -> Result<CallToolResult, McpError> {
        refresh_impl(&self.router).await
    }

    #[tool(description = "Push trigger. Decodes a push payload into the notification to display.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.router, params.0)
    }

    #[tool(description = "Notification click trigger. Returns whether to dismiss or which URL to open.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.router, params.0)
    }

    #[tool(description = "List cache namespaces with their entry counts.")]
    async fn cache_namespaces(&self) -> Result<CallToolResult, McpError> {
        namespaces_impl(self.store.as_ref(), self.router.cache_name()).await
    }
}

impl ServerHandler for SwProxyServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swproxy".into(),
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
