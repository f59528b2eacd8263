//! Push payload hand-off.
//!
//! Rendering and window focusing belong to the host; this only decodes what
//! a push carries and decides what a click should open.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

const DEFAULT_BODY: &str = "New offer available!";
const DEFAULT_URL: &str = "/";

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    title: Option<String>,
    body: Option<String>,
    icon: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// What the host should display for a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Target handed back on click.
    pub url: String,
    pub actions: Vec<NotificationAction>,
}

/// What a notification click resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum ClickOutcome {
    Dismiss,
    OpenWindow(String),
}

#[derive(Debug, Clone)]
pub struct NotificationDefaults {
    pub title: String,
    pub icon: String,
}

impl NotificationDefaults {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { title: config.notification_title.clone(), icon: config.notification_icon.clone() }
    }

    /// Decode a push payload. JSON fills the fields it carries; anything
    /// else becomes the body text.
    pub fn notification(&self, payload: Option<&[u8]>) -> Notification {
        let parsed = match payload {
            None => PushPayload::default(),
            Some(bytes) => serde_json::from_slice::<PushPayload>(bytes).unwrap_or_else(|_| {
                let text = String::from_utf8_lossy(bytes).trim().to_string();
                PushPayload { body: (!text.is_empty()).then_some(text), ..Default::default() }
            }),
        };

        Notification {
            title: parsed.title.unwrap_or_else(|| self.title.clone()),
            body: parsed.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            icon: parsed.icon.unwrap_or_else(|| self.icon.clone()),
            url: parsed.url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            actions: vec![
                NotificationAction { action: "explore".into(), title: "View offer".into() },
                NotificationAction { action: "close".into(), title: "Close".into() },
            ],
        }
    }
}

/// Resolve a click: `close` dismisses, anything else opens the target.
pub fn click(action: Option<&str>, url: Option<&str>) -> ClickOutcome {
    if action == Some("close") {
        return ClickOutcome::Dismiss;
    }
    let target = url.filter(|u| !u.trim().is_empty()).unwrap_or(DEFAULT_URL);
    ClickOutcome::OpenWindow(target.to_string())
}
