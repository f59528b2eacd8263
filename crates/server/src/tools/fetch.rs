//! sw_fetch tool implementation.
//!
//! Routes one request through the proxy exactly as an intercepted page
//! request would be, and reports where the answer came from.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::canonical::canonicalize;
use swproxy_core::{Destination, Error, Request, RequestMode, ServiceRouter, Source};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request destination: document, image, style, script, font or other.
    #[serde(default)]
    pub destination: Option<String>,

    /// Request mode: navigate, same-origin, no-cors or cors.
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body as UTF-8 text.
    #[serde(default)]
    pub body: Option<String>,
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    /// basic, cors, opaque or error.
    pub response_type: String,
    /// network, cache or fallback.
    pub source: Source,
    pub headers: BTreeMap<String, String>,
    pub bytes: usize,
    /// Body as text when it is valid UTF-8.
    pub body: Option<String>,
    /// Hex-encoded body otherwise.
    pub body_hex: Option<String>,
}

fn build_request(router: &ServiceRouter, params: SwFetchParams) -> Result<Request, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let url = canonicalize(router.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let mut request = Request::new(params.method.as_deref().unwrap_or("GET"), url);

    if let Some(destination) = &params.destination {
        request = request.with_destination(destination.parse::<Destination>().map_err(ToolError::InvalidInput)?);
    }
    if let Some(mode) = &params.mode {
        request = request.with_mode(mode.parse::<RequestMode>().map_err(ToolError::InvalidInput)?);
    }
    for (name, value) in &params.headers {
        request = request.with_header(name, value);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(router: &ServiceRouter, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(router, params)?;
    let served = router.fetch(&request).await.map_err(Error::Network)?;

    tracing::debug!(url = %request.url, source = ?served.source, status = served.response.status, "served");

    let response = served.response;
    let url = response.url.as_ref().map_or_else(|| request.url.to_string(), |u| u.to_string());
    let status = response.status;
    let status_text = response.status_text.clone();
    let response_type = response.response_type.as_str().to_string();
    let headers = response.headers.clone();
    let body = response.into_body();

    let (text, hex_body) = match std::str::from_utf8(&body) {
        Ok(text) => (Some(text.to_string()), None),
        Err(_) => (None, Some(hex::encode(&body))),
    };

    json_result(&SwFetchOutput {
        url,
        status,
        status_text,
        response_type,
        source: served.source,
        headers,
        bytes: body.len(),
        body: text,
        body_hex: hex_body,
    })
}
