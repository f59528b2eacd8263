//! MCP tool implementations.
//!
//! One tool per trigger the host would otherwise deliver, plus a read-only
//! view of the cache namespaces.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod notify;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::namespaces_impl;
pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl, refresh_impl};
pub use message::{SwMessageParams, message_impl};
pub use notify::{SwNotificationClickParams, SwPushParams, click_impl, push_impl};

/// Pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
