//! Strategy execution: network-first, cache-first and bypass.
//!
//! Storage is best-effort throughout. A failed open, lookup or put is logged
//! and treated as a miss or no-op; only a network failure can trigger a
//! fallback, and only a network failure is ever returned to the caller.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, Namespace, StoredResponse};
use crate::classify::{Route, StrategyBucket};
use crate::error::NetworkError;
use crate::fallback::Fallbacks;
use crate::fetcher::{NetworkFetcher, issue_with_timeout};
use crate::http::{Request, RequestKey, Response};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Network,
    Cache,
    Fallback,
}

/// A response handed back to the page.
#[derive(Debug)]
pub struct Served {
    pub response: Response,
    pub source: Source,
}

impl Served {
    fn network(response: Response) -> Self {
        Self { response, source: Source::Network }
    }

    fn cache(response: Response) -> Self {
        Self { response, source: Source::Cache }
    }

    fn fallback(response: Response) -> Self {
        Self { response, source: Source::Fallback }
    }
}

/// Runs the caching policy selected by the classifier.
pub struct StrategyExecutor {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn NetworkFetcher>,
    cache_name: String,
    fallbacks: Fallbacks,
    timeout: Option<Duration>,
}

impl StrategyExecutor {
    pub fn new(
        store: Arc<dyn CacheStore>, fetcher: Arc<dyn NetworkFetcher>, cache_name: impl Into<String>,
        fallbacks: Fallbacks,
    ) -> Self {
        Self { store, fetcher, cache_name: cache_name.into(), fallbacks, timeout: None }
    }

    /// Deadline for network calls made by the caching strategies.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub async fn execute(&self, route: Route, request: &Request) -> Result<Served, NetworkError> {
        match route {
            Route::PassThrough | Route::Bucket(StrategyBucket::RemoteService) => self.bypass(request).await,
            Route::Bucket(bucket @ (StrategyBucket::Navigation | StrategyBucket::Default)) => {
                self.network_first(bucket, request).await
            }
            Route::Bucket(StrategyBucket::StaticAsset) => self.cache_first(request).await,
        }
    }

    /// Forward to the network untouched. The store is never consulted and
    /// the fetcher's result, failure included, is returned as is.
    pub async fn bypass(&self, request: &Request) -> Result<Served, NetworkError> {
        tracing::debug!(url = %request.url, method = %request.method, "bypassing cache");
        self.fetcher.issue(request).await.map(Served::network)
    }

    /// Network, then the exact cache entry, then the bucket's fallback chain.
    pub async fn network_first(&self, bucket: StrategyBucket, request: &Request) -> Result<Served, NetworkError> {
        let error = match issue_with_timeout(self.fetcher.as_ref(), request, self.timeout).await {
            Ok(response) => {
                if response.is_ok() {
                    self.persist(request.key(), response.duplicate()).await;
                }
                return Ok(Served::network(response));
            }
            Err(error) => error,
        };

        tracing::debug!(url = %request.url, %bucket, error = %error, "network failed, trying cache");

        let namespace = self.namespace().await;
        if let Some(ns) = &namespace
            && let Some(hit) = self.lookup(ns, &request.key()).await
        {
            return Ok(Served::cache(hit));
        }

        self.fall_back(bucket, request, namespace.as_ref(), error).await
    }

    /// Exact cache entry, then the network, then the bucket's fallback chain.
    pub async fn cache_first(&self, request: &Request) -> Result<Served, NetworkError> {
        let namespace = self.namespace().await;
        if let Some(ns) = &namespace
            && let Some(hit) = self.lookup(ns, &request.key()).await
        {
            tracing::debug!(url = %request.url, "serving from cache");
            return Ok(Served::cache(hit));
        }

        match issue_with_timeout(self.fetcher.as_ref(), request, self.timeout).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.persist(request.key(), response.duplicate()).await;
                } else {
                    tracing::debug!(
                        url = %request.url,
                        status = response.status,
                        response_type = %response.response_type,
                        "not caching response"
                    );
                }
                Ok(Served::network(response))
            }
            Err(error) => {
                self.fall_back(StrategyBucket::StaticAsset, request, namespace.as_ref(), error)
                    .await
            }
        }
    }

    async fn fall_back(
        &self, bucket: StrategyBucket, request: &Request, namespace: Option<&Namespace>, error: NetworkError,
    ) -> Result<Served, NetworkError> {
        if let Some(chain) = self.fallbacks.chain_for(bucket, request.destination)
            && let Some(response) = chain.resolve(namespace).await
        {
            tracing::info!(url = %request.url, %bucket, "serving fallback");
            return Ok(Served::fallback(response));
        }

        tracing::warn!(url = %request.url, %bucket, error = %error, "no cache entry or fallback");
        Err(error)
    }

    async fn namespace(&self) -> Option<Namespace> {
        match Namespace::open(self.store.clone(), &self.cache_name).await {
            Ok(ns) => Some(ns),
            Err(e) => {
                tracing::warn!(namespace = %self.cache_name, error = %e, "cache unavailable");
                None
            }
        }
    }

    async fn lookup(&self, namespace: &Namespace, key: &RequestKey) -> Option<Response> {
        match namespace.lookup(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Store a duplicate of a response. The write runs on its own task so it
    /// finishes even if the caller stops waiting.
    async fn persist(&self, key: RequestKey, response: Response) {
        let store = self.store.clone();
        let namespace = self.cache_name.clone();

        let write = tokio::spawn(async move {
            if let Err(e) = store.put(&namespace, &key, StoredResponse::from_response(response)).await {
                tracing::warn!(key = %key, error = %e, "cache put failed");
            }
        });

        if let Err(e) = write.await {
            tracing::warn!(error = %e, "cache write task failed");
        }
    }
}
