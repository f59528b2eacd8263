//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{ActivationReport, ControlMessage, ServiceRouter, WorkerState};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message type, e.g. `SKIP_WAITING`.
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    pub state: WorkerState,
    /// Present when the message activated a waiting worker.
    pub activation: Option<ActivationReport>,
}

pub async fn message_impl(router: &ServiceRouter, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message: ControlMessage = serde_json::from_value(serde_json::json!({ "type": params.kind.trim() }))
        .map_err(|_| ToolError::InvalidInput(format!("unknown message type: {}", params.kind)))?;

    let activation = router.message(message).await?;
    json_result(&SwMessageOutput { state: router.state(), activation })
}
