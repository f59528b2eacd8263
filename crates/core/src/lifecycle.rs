//! Install-time population, the activation sweep and periodic refresh.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::Error;
use crate::cache::{CacheStore, Namespace};
use crate::canonical::{canonicalize, parse_origin};
use crate::config::AppConfig;
use crate::fetcher::{NetworkFetcher, issue_with_timeout};
use crate::http::{Request, RequestKey};

/// An essential URL that could not be cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// Outcome of populating the essential manifest.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub namespace: String,
    pub cached: Vec<String>,
    pub failed: Vec<FailedUrl>,
    /// False whenever any essential URL is missing from the namespace.
    pub complete: bool,
}

impl InstallReport {
    /// The report as an error when population was partial.
    pub fn ensure_complete(&self) -> Result<(), Error> {
        if self.complete {
            Ok(())
        } else {
            Err(Error::ManifestIncomplete {
                failed: self.failed.len(),
                total: self.failed.len() + self.cached.len(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ActivationReport {
    pub current: String,
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub failed: usize,
}

/// Version lifecycle over the shared store.
pub struct LifecycleManager {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn NetworkFetcher>,
    cache_name: String,
    essential: Vec<Url>,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn CacheStore>, fetcher: Arc<dyn NetworkFetcher>, cache_name: impl Into<String>,
        essential: Vec<Url>,
    ) -> Self {
        Self { store, fetcher, cache_name: cache_name.into(), essential, concurrency: 4, timeout: None }
    }

    pub fn from_config(
        config: &AppConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn NetworkFetcher>,
    ) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let essential = config
            .essential_urls
            .iter()
            .map(|raw| canonicalize(&origin, raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(store, fetcher, &config.cache_name, essential)
            .with_concurrency(config.install_concurrency)
            .with_timeout(config.network_timeout()))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open the current namespace and cache every essential URL.
    ///
    /// A URL fails when the fetch fails, the status is not 2xx, or the write
    /// fails. Failures are logged and reported; they never abort the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let namespace = Namespace::open(self.store.clone(), &self.cache_name).await?;
        tracing::info!(namespace = %self.cache_name, count = self.essential.len(), "caching essential urls");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut join_set = JoinSet::new();

        for url in self.essential.clone() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::InvalidInput(format!("install limiter closed: {e}")))?;
            let fetcher = self.fetcher.clone();
            let namespace = namespace.clone();
            let timeout = self.timeout;

            join_set.spawn(async move {
                let _permit = permit;
                let request = Request::get(url.clone());
                let outcome = match issue_with_timeout(fetcher.as_ref(), &request, timeout).await {
                    Ok(response) if response.is_ok() => namespace
                        .store(&request.key(), response)
                        .await
                        .map_err(|e| e.to_string()),
                    Ok(response) => Err(format!("status {}", response.status)),
                    Err(e) => Err(e.to_string()),
                };
                (url, outcome)
            });
        }

        let mut cached = Vec::new();
        let mut failed = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((url, Ok(()))) => cached.push(url.to_string()),
                Ok((url, Err(reason))) => {
                    tracing::error!(url = %url, reason = %reason, "failed to cache essential url");
                    failed.push(FailedUrl { url: url.to_string(), reason });
                }
                Err(e) => {
                    tracing::error!(error = %e, "essential url task failed");
                    failed.push(FailedUrl { url: String::new(), reason: e.to_string() });
                }
            }
        }

        cached.sort();
        failed.sort_by(|a, b| a.url.cmp(&b.url));
        let complete = failed.is_empty();
        if complete {
            tracing::info!(namespace = %self.cache_name, "essential urls cached");
        } else {
            tracing::error!(
                namespace = %self.cache_name,
                failed = failed.len(),
                "install continuing with a partially populated cache"
            );
        }

        Ok(InstallReport { namespace: self.cache_name.clone(), cached, failed, complete })
    }

    /// Delete every namespace other than the current one.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let names = self.store.namespaces().await?;
        let mut deleted = Vec::new();
        let mut failed = Vec::new();

        for name in names.into_iter().filter(|name| name != &self.cache_name) {
            tracing::info!(namespace = %name, "deleting stale cache");
            match self.store.delete_namespace(&name).await {
                Ok(_) => deleted.push(name),
                Err(e) => {
                    tracing::warn!(namespace = %name, error = %e, "failed to delete stale cache");
                    failed.push(name);
                }
            }
        }

        Ok(ActivationReport { current: self.cache_name.clone(), deleted, failed })
    }

    /// Re-fetch every stored key and overwrite entries that come back 2xx.
    pub async fn refresh(&self) -> Result<RefreshReport, Error> {
        let namespace = Namespace::open(self.store.clone(), &self.cache_name).await?;
        let keys = namespace.keys().await?;
        let mut report = RefreshReport::default();

        for key in keys {
            match self.refresh_one(&namespace, &key).await {
                Ok(()) => report.refreshed += 1,
                Err(reason) => {
                    tracing::warn!(key = %key, reason = %reason, "refresh skipped");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            namespace = %self.cache_name,
            refreshed = report.refreshed,
            failed = report.failed,
            "refresh sweep finished"
        );
        Ok(report)
    }

    async fn refresh_one(&self, namespace: &Namespace, key: &RequestKey) -> Result<(), String> {
        let request = key.to_request();
        let response = issue_with_timeout(self.fetcher.as_ref(), &request, self.timeout)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_ok() {
            return Err(format!("status {}", response.status));
        }

        namespace.store(key, response).await.map_err(|e| e.to_string())
    }
}
