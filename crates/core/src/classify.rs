//! Request classification.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. Non-GET requests pass through untouched.
//! 2. Remote-service hosts and same-origin live paths are `RemoteService`.
//! 3. Navigations and HTML entry points are `Navigation`.
//! 4. Images, styles, scripts and fonts are `StaticAsset`.
//! 5. Everything else is `Default`.
//!
//! Rule 2 runs before rule 3 so a navigation to an auth or analytics host
//! is never cached.

use std::fmt;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::canonical::{parse_origin, same_origin};
use crate::config::AppConfig;
use crate::http::{Destination, Request, RequestMode};

/// Caching policy family a GET request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyBucket {
    Navigation,
    StaticAsset,
    RemoteService,
    Default,
}

impl fmt::Display for StrategyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyBucket::Navigation => "NAVIGATION",
            StrategyBucket::StaticAsset => "STATIC_ASSET",
            StrategyBucket::RemoteService => "REMOTE_SERVICE",
            StrategyBucket::Default => "DEFAULT",
        };
        f.write_str(name)
    }
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Non-GET: straight to the network, no cache involvement at all.
    PassThrough,
    Bucket(StrategyBucket),
}

/// Pure function from request attributes to a [`Route`].
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    remote_hosts: Vec<Regex>,
    live_paths: Vec<String>,
}

impl Classifier {
    pub fn new(origin: Url, remote_hosts: &[String], live_paths: Vec<String>) -> Result<Self, Error> {
        let remote_hosts = remote_hosts
            .iter()
            .map(|pattern| Regex::new(pattern).map_err(|e| Error::InvalidInput(format!("remote host {pattern}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { origin, remote_hosts, live_paths })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Self::new(origin, &config.remote_hosts, config.live_paths.clone())
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn classify(&self, request: &Request) -> Route {
        if !request.is_get() {
            return Route::PassThrough;
        }

        let bucket = if self.is_remote_service(&request.url) {
            StrategyBucket::RemoteService
        } else if self.is_navigation(request) {
            StrategyBucket::Navigation
        } else if request.destination.is_static_asset() {
            StrategyBucket::StaticAsset
        } else {
            StrategyBucket::Default
        };

        Route::Bucket(bucket)
    }

    fn is_remote_service(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default();
        if self.remote_hosts.iter().any(|re| re.is_match(host)) {
            return true;
        }

        same_origin(url, &self.origin) && self.live_paths.iter().any(|prefix| url.path().starts_with(prefix.as_str()))
    }

    fn is_navigation(&self, request: &Request) -> bool {
        if request.mode == RequestMode::Navigate || request.destination == Destination::Document {
            return true;
        }

        let path = request.url.path();
        path.ends_with(".html") || path.ends_with(".htm") || (path == "/" && same_origin(&request.url, &self.origin))
    }
}
