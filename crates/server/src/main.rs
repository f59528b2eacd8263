//! swproxy server entry point.
//!
//! Boots the proxy, runs the install trigger, starts the periodic refresh
//! timer and serves the trigger tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swproxy_client::{FetchConfig, HttpFetcher};
use swproxy_core::{AppConfig, CacheDb, CacheStore, ServiceRouter};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(cache_name = %config.cache_name, origin = %config.origin, "starting swproxy on stdio transport");

    let store: Arc<dyn CacheStore> = Arc::new(CacheDb::open(&config.db_path).await?);
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from_app_config(&config)?)?);
    let router = Arc::new(ServiceRouter::from_config(&config, store.clone(), fetcher)?);

    let outcome = router.install().await;
    if let Some(report) = &outcome.report {
        tracing::info!(cached = report.cached.len(), failed = report.failed.len(), "install finished");
    }

    if let Some(period) = config.refresh_interval() {
        let router = router.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match router.periodic().await {
                    Ok(report) => {
                        tracing::info!(refreshed = report.refreshed, failed = report.failed, "periodic refresh")
                    }
                    Err(e) => tracing::warn!(error = %e, "periodic refresh failed"),
                }
            }
        });
    }

    let handler = handler::SwProxyServer::new(router, store);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
