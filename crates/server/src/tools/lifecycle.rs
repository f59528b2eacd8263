//! sw_install, sw_activate and sw_refresh tools.
//!
//! These drive the version lifecycle the host would otherwise trigger on
//! deploy and on its refresh timer.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{ActivationReport, InstallOutcome, RefreshReport, ServiceRouter, WorkerState};

use super::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    /// Worker state after the install trigger ran.
    pub state: WorkerState,
    #[serde(flatten)]
    pub outcome: InstallOutcome,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub state: WorkerState,
    pub report: ActivationReport,
}

/// Output from the sw_refresh tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwRefreshOutput {
    pub namespace: String,
    #[serde(flatten)]
    pub report: RefreshReport,
}

pub async fn install_impl(router: &ServiceRouter) -> Result<CallToolResult, McpError> {
    let outcome = router.install().await;
    json_result(&SwInstallOutput { state: router.state(), outcome })
}

pub async fn activate_impl(router: &ServiceRouter) -> Result<CallToolResult, McpError> {
    let report = router.activate().await?;
    json_result(&SwActivateOutput { state: router.state(), report })
}

pub async fn refresh_impl(router: &ServiceRouter) -> Result<CallToolResult, McpError> {
    let report = router.periodic().await?;
    tracing::info!(refreshed = report.refreshed, failed = report.failed, "refresh complete");
    json_result(&SwRefreshOutput { namespace: router.cache_name().to_string(), report })
}
