//! Trigger router: one method per host event.
//!
//! The host adapter calls these; nothing here knows about browsers, MCP or
//! timers. Worker state lives in a watch channel so that fetches arriving
//! during activation wait for the sweep to finish before they are served.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::Error;
use crate::cache::CacheStore;
use crate::classify::{Classifier, Route};
use crate::config::AppConfig;
use crate::error::NetworkError;
use crate::fallback::Fallbacks;
use crate::fetcher::NetworkFetcher;
use crate::http::Request;
use crate::lifecycle::{ActivationReport, InstallReport, LifecycleManager, RefreshReport};
use crate::notify::{self, ClickOutcome, Notification, NotificationDefaults};
use crate::strategy::{Served, StrategyExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    /// Controls clients; fetches go through the caching strategies.
    Activated,
}

/// Control messages posted by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InstallOutcome {
    /// None when the store could not be opened at all.
    pub report: Option<InstallReport>,
    /// Present when activation followed immediately.
    pub activation: Option<ActivationReport>,
}

pub struct ServiceRouter {
    classifier: Classifier,
    executor: StrategyExecutor,
    lifecycle: LifecycleManager,
    notifications: NotificationDefaults,
    skip_waiting: bool,
    state: watch::Sender<WorkerState>,
}

impl ServiceRouter {
    pub fn new(
        classifier: Classifier, executor: StrategyExecutor, lifecycle: LifecycleManager,
        notifications: NotificationDefaults,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Parsed);
        Self { classifier, executor, lifecycle, notifications, skip_waiting: false, state }
    }

    /// Wire every component from configuration around a store and fetcher.
    pub fn from_config(
        config: &AppConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn NetworkFetcher>,
    ) -> Result<Self, Error> {
        let classifier = Classifier::from_config(config)?;
        let executor =
            StrategyExecutor::new(store.clone(), fetcher.clone(), &config.cache_name, Fallbacks::from_config(config)?)
                .with_timeout(config.network_timeout());
        let lifecycle = LifecycleManager::from_config(config, store, fetcher)?;

        Ok(Self::new(classifier, executor, lifecycle, NotificationDefaults::from_config(config))
            .with_skip_waiting(config.skip_waiting))
    }

    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn cache_name(&self) -> &str {
        self.executor.cache_name()
    }

    /// Origin relative URLs resolve against.
    pub fn origin(&self) -> &url::Url {
        self.classifier.origin()
    }

    /// Install trigger: populate the essential manifest. Population problems
    /// are reported, never fatal.
    ///
    /// An already active router repopulates its namespace and stays in
    /// control.
    pub async fn install(&self) -> InstallOutcome {
        if self.state() == WorkerState::Activated {
            tracing::info!(namespace = %self.cache_name(), "reinstalling while active");
            let report = self.populate().await;
            return InstallOutcome { report, activation: None };
        }

        self.state.send_replace(WorkerState::Installing);
        let report = self.populate().await;

        self.state.send_replace(WorkerState::Installed);
        tracing::info!(namespace = %self.cache_name(), "installed");

        let activation = if self.skip_waiting { self.activate().await.ok() } else { None };

        InstallOutcome { report, activation }
    }

    async fn populate(&self) -> Option<InstallReport> {
        match self.lifecycle.install().await {
            Ok(report) => {
                if let Err(e) = report.ensure_complete() {
                    tracing::warn!(error = %e, "essential manifest only partly cached");
                }
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "cache unavailable during install");
                None
            }
        }
    }

    /// Activate trigger: sweep stale namespaces, then take control.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        self.state.send_replace(WorkerState::Activating);
        let sweep = self.lifecycle.activate().await;
        if let Err(e) = &sweep {
            tracing::error!(error = %e, "activation sweep failed");
        }

        self.state.send_replace(WorkerState::Activated);
        tracing::info!(namespace = %self.cache_name(), "activated, controlling clients");
        sweep
    }

    /// Fetch trigger.
    ///
    /// Before activation the client is uncontrolled and the request goes
    /// straight to the network.
    pub async fn fetch(&self, request: &Request) -> Result<Served, NetworkError> {
        let mut state = self.state.subscribe();
        let current = match state.wait_for(|s| *s != WorkerState::Activating).await {
            Ok(s) => *s,
            Err(_) => self.state(),
        };

        if current != WorkerState::Activated {
            return self.executor.bypass(request).await;
        }

        let route = self.classifier.classify(request);
        match route {
            Route::Bucket(bucket) => tracing::debug!(url = %request.url, %bucket, "classified"),
            Route::PassThrough => tracing::debug!(url = %request.url, method = %request.method, "pass-through"),
        }
        self.executor.execute(route, request).await
    }

    /// Message trigger. `SKIP_WAITING` activates a waiting worker at once.
    pub async fn message(&self, message: ControlMessage) -> Result<Option<ActivationReport>, Error> {
        match message {
            ControlMessage::SkipWaiting if self.state() == WorkerState::Installed => self.activate().await.map(Some),
            ControlMessage::SkipWaiting => {
                tracing::debug!(state = ?self.state(), "skip waiting ignored");
                Ok(None)
            }
        }
    }

    /// Periodic trigger: refresh every entry of the current namespace.
    pub async fn periodic(&self) -> Result<RefreshReport, Error> {
        self.lifecycle.refresh().await
    }

    pub fn push(&self, payload: Option<&[u8]>) -> Notification {
        self.notifications.notification(payload)
    }

    pub fn notification_click(&self, action: Option<&str>, url: Option<&str>) -> ClickOutcome {
        notify::click(action, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheDb;
    use crate::http::{Destination, RequestMode};
    use crate::strategy::Source;
    use crate::testing::{Canned, CountingStore, ORIGIN, ScriptedFetcher, url};
    use std::time::Duration;

    fn config() -> AppConfig {
        AppConfig {
            origin: ORIGIN.into(),
            cache_name: "app-v3".into(),
            essential_urls: vec!["/".into(), "/offline".into(), "/logo.png".into()],
            ..Default::default()
        }
    }

    async fn scripted() -> Arc<ScriptedFetcher> {
        let fetcher = ScriptedFetcher::new();
        fetcher.respond(&url("/"), Canned::ok(b"home")).await;
        fetcher.respond(&url("/offline"), Canned::ok(b"offline")).await;
        fetcher.respond(&url("/logo.png"), Canned::ok(b"png")).await;
        fetcher
    }

    #[tokio::test]
    async fn test_install_with_skip_waiting_activates() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        store.open("app-v1").await.unwrap();
        let router = ServiceRouter::from_config(&config(), store.clone(), scripted().await).unwrap();
        assert_eq!(router.state(), WorkerState::Parsed);

        let outcome = router.install().await;
        assert!(outcome.report.unwrap().complete);
        assert_eq!(outcome.activation.unwrap().deleted, vec!["app-v1".to_string()]);
        assert_eq!(router.state(), WorkerState::Activated);
        assert_eq!(store.namespaces().await.unwrap(), vec!["app-v3".to_string()]);
    }

    #[tokio::test]
    async fn test_waiting_worker_until_skip_waiting() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let config = AppConfig { skip_waiting: false, ..config() };
        let router = ServiceRouter::from_config(&config, store, scripted().await).unwrap();

        let outcome = router.install().await;
        assert!(outcome.activation.is_none());
        assert_eq!(router.state(), WorkerState::Installed);

        let report = router.message(ControlMessage::SkipWaiting).await.unwrap();
        assert!(report.is_some());
        assert_eq!(router.state(), WorkerState::Activated);

        let again = router.message(ControlMessage::SkipWaiting).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_reinstall_keeps_control() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let config = AppConfig { skip_waiting: false, ..config() };
        let fetcher = scripted().await;
        let router = ServiceRouter::from_config(&config, store, fetcher.clone()).unwrap();

        router.install().await;
        router.message(ControlMessage::SkipWaiting).await.unwrap();

        let again = router.install().await;
        assert!(again.report.unwrap().complete);
        assert!(again.activation.is_none());
        assert_eq!(router.state(), WorkerState::Activated);

        fetcher.fail(&url("/"), NetworkError::Offline("down".into())).await;
        let page = router.fetch(&Request::get(url("/")).with_mode(RequestMode::Navigate)).await.unwrap();
        assert_eq!(page.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_fragment_shares_cache_entry() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = scripted().await;
        let router = ServiceRouter::from_config(&config(), store, fetcher.clone()).unwrap();
        router.install().await;

        fetcher.fail(&url("/#top"), NetworkError::Offline("down".into())).await;
        let page = router
            .fetch(&Request::get(url("/#top")).with_mode(RequestMode::Navigate))
            .await
            .unwrap();
        assert_eq!(page.source, Source::Cache);
        assert_eq!(page.response.body().as_ref(), b"home");
    }

    #[tokio::test]
    async fn test_uncontrolled_fetch_skips_cache() {
        let store = CountingStore::new().await;
        let router = ServiceRouter::from_config(&config(), store.clone(), scripted().await).unwrap();

        let served = router.fetch(&Request::get(url("/")).with_mode(RequestMode::Navigate)).await.unwrap();
        assert_eq!(served.source, Source::Network);
        assert_eq!(store.reads() + store.writes(), 0);
    }

    #[tokio::test]
    async fn test_fetch_after_install_served_offline() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = scripted().await;
        let router = ServiceRouter::from_config(&config(), store, fetcher.clone()).unwrap();
        router.install().await;

        fetcher.fail(&url("/"), NetworkError::Offline("down".into())).await;
        fetcher.fail(&url("/logo.png"), NetworkError::Offline("down".into())).await;

        let page = router.fetch(&Request::get(url("/")).with_mode(RequestMode::Navigate)).await.unwrap();
        assert_eq!(page.source, Source::Cache);
        assert_eq!(page.response.body().as_ref(), b"home");

        let missing = router
            .fetch(&Request::get(url("/cart")).with_mode(RequestMode::Navigate))
            .await
            .unwrap();
        assert_eq!(missing.source, Source::Fallback);
        assert_eq!(missing.response.body().as_ref(), b"offline");

        let logo = router
            .fetch(&Request::get(url("/logo.png")).with_destination(Destination::Image))
            .await
            .unwrap();
        assert_eq!(logo.source, Source::Cache);
    }

    #[tokio::test]
    async fn test_fetch_waits_for_activation() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let router = Arc::new(ServiceRouter::from_config(&config(), store, scripted().await).unwrap());
        router.state.send_replace(WorkerState::Activating);

        let pending = {
            let router = router.clone();
            let request = Request::get(url("/logo.png")).with_destination(Destination::Image);
            tokio::spawn(async move { router.fetch(&request).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        router.state.send_replace(WorkerState::Activated);
        let served = pending.await.unwrap().unwrap();
        assert_eq!(served.source, Source::Network);
    }

    #[tokio::test]
    async fn test_periodic_refresh() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = scripted().await;
        let router = ServiceRouter::from_config(&config(), store, fetcher).unwrap();
        router.install().await;

        let report = router.periodic().await.unwrap();
        assert_eq!(report.refreshed, 3);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_push_and_click() {
        let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let router = ServiceRouter::from_config(&config(), store, scripted().await).unwrap();

        let n = router.push(Some(br#"{"url":"/offers/1"}"#));
        assert_eq!(n.title, "Showroom +Roma");
        assert_eq!(
            router.notification_click(Some("explore"), Some(&n.url)),
            ClickOutcome::OpenWindow("/offers/1".into())
        );
    }

    #[test]
    fn test_control_message_wire_format() {
        let msg: ControlMessage = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
        assert_eq!(msg, ControlMessage::SkipWaiting);
    }
}
