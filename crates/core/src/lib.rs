//! Core of the offline-first request proxy.
//!
//! This crate provides:
//! - A versioned response cache with a SQLite backend
//! - Request classification and the caching strategies
//! - The install/activate/refresh lifecycle
//! - A trigger router the host adapter drives
//! - Unified error types and layered configuration

pub mod cache;
pub mod canonical;
pub mod classify;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetcher;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod router;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use cache::{CacheDb, CacheStore, Namespace, StoredResponse};
pub use classify::{Classifier, Route, StrategyBucket};
pub use config::{AppConfig, ConfigError};
pub use error::{Error, NetworkError};
pub use fallback::{Fallback, FallbackChain, Fallbacks, InlineResponse};
pub use fetcher::NetworkFetcher;
pub use http::{Destination, Request, RequestKey, RequestMode, Response, ResponseType};
pub use lifecycle::{ActivationReport, FailedUrl, InstallReport, LifecycleManager, RefreshReport};
pub use notify::{ClickOutcome, Notification};
pub use router::{ControlMessage, InstallOutcome, ServiceRouter, WorkerState};
pub use strategy::{Served, Source, StrategyExecutor};
