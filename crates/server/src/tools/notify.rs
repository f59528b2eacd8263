//! sw_push and sw_notification_click tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::ServiceRouter;

use super::json_result;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload; JSON `{title, body, icon, url}` or plain text.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Action button that was clicked, if any.
    #[serde(default)]
    pub action: Option<String>,
    /// Target carried by the notification.
    #[serde(default)]
    pub url: Option<String>,
}

pub fn push_impl(router: &ServiceRouter, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = router.push(params.payload.as_deref().map(str::as_bytes));
    json_result(&notification)
}

pub fn click_impl(router: &ServiceRouter, params: SwNotificationClickParams) -> Result<CallToolResult, McpError> {
    let outcome = router.notification_click(params.action.as_deref(), params.url.as_deref());
    json_result(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{json, router};

    #[tokio::test]
    async fn test_push_defaults() {
        let (router, _store) = router().await;
        let value = json(&push_impl(&router, SwPushParams::default()).unwrap());
        assert_eq!(value["title"], "Showroom +Roma");
        assert_eq!(value["url"], "/");
    }

    #[tokio::test]
    async fn test_click_close_dismisses() {
        let (router, _store) = router().await;
        let value = json(
            &click_impl(&router, SwNotificationClickParams { action: Some("close".into()), url: None }).unwrap(),
        );
        assert_eq!(value["kind"], "dismiss");

        let value = json(
            &click_impl(&router, SwNotificationClickParams { action: None, url: Some("/offers/9".into()) }).unwrap(),
        );
        assert_eq!(value["kind"], "open_window");
        assert_eq!(value["url"], "/offers/9");
    }
}
