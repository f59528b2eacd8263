//! cache_namespaces tool implementation.
//!
//! Lists every namespace in the store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::CacheStore;

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NamespaceInfo {
    pub name: String,
    pub entries: usize,
    /// True for the namespace the proxy reads and writes.
    pub current: bool,
}

/// Output from the cache_namespaces tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheNamespacesOutput {
    pub current: String,
    pub namespaces: Vec<NamespaceInfo>,
}

pub async fn namespaces_impl(store: &dyn CacheStore, current: &str) -> Result<CallToolResult, McpError> {
    let mut namespaces = Vec::new();
    for name in store.namespaces().await? {
        let entries = store.keys(&name).await?.len();
        let is_current = name == current;
        namespaces.push(NamespaceInfo { name, entries, current: is_current });
    }

    json_result(&CacheNamespacesOutput { current: current.to_string(), namespaces })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::lifecycle::install_impl;
    use crate::tools::test_support::{json, router};

    #[tokio::test]
    async fn test_empty_store() {
        let (_router, store) = router().await;
        let value = json(&namespaces_impl(store.as_ref(), "app-v3").await.unwrap());
        assert_eq!(value["namespaces"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_lists_current_after_install() {
        let (router, store) = router().await;
        install_impl(&router).await.unwrap();

        let value = json(&namespaces_impl(store.as_ref(), router.cache_name()).await.unwrap());
        let namespaces = value["namespaces"].as_array().unwrap();
        assert_eq!(namespaces.len(), 1);
        assert_eq!(namespaces[0]["name"], "app-v3");
        assert_eq!(namespaces[0]["entries"], 3);
        assert_eq!(namespaces[0]["current"], true);
    }
}
