//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SWPROXY_*)
//! 2. TOML config file (if SWPROXY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SWPROXY_*)
/// 2. TOML config file (if SWPROXY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Name of the current cache namespace; embeds the deployed version.
    ///
    /// Every other namespace is deleted on activation.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// The application's own origin. Relative URLs resolve against it and
    /// responses from it count as same-origin.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// URLs cached at install time.
    #[serde(default = "default_essential_urls")]
    pub essential_urls: Vec<String>,

    /// Host patterns (regex) that are always fetched live.
    #[serde(default = "default_remote_hosts")]
    pub remote_hosts: Vec<String>,

    /// Same-origin path prefixes that are always fetched live.
    #[serde(default = "default_live_paths")]
    pub live_paths: Vec<String>,

    /// Document served to navigations when offline and uncached.
    #[serde(default = "default_offline_url")]
    pub offline_url: String,

    /// Pre-cached image served when an image cannot be fetched.
    #[serde(default)]
    pub image_placeholder_url: Option<String>,

    /// Synthesize an inline SVG when no cached image placeholder resolves.
    #[serde(default = "default_true")]
    pub inline_image_placeholder: bool,

    /// Body of a `503` text response for non-image assets that fail uncached.
    #[serde(default)]
    pub asset_unavailable_text: Option<String>,

    /// Seconds between periodic refresh sweeps; 0 disables the timer.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Optional deadline around every network call, in milliseconds.
    #[serde(default)]
    pub network_timeout_ms: Option<u64>,

    /// Activate right after install instead of waiting for a control message.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Parallel fetches while populating the essential manifest.
    #[serde(default = "default_install_concurrency")]
    pub install_concurrency: usize,

    /// Title used when a push payload carries none.
    #[serde(default = "default_notification_title")]
    pub notification_title: String,

    /// Icon used when a push payload carries none.
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./swproxy-cache.sqlite")
}

fn default_cache_name() -> String {
    "app-cache-v3".into()
}

fn default_origin() -> String {
    "http://localhost:5000".into()
}

fn default_essential_urls() -> Vec<String> {
    ["/", "/index.html", "/offline", "/manifest.json", "/icon.png", "/logo.png", "/favicon.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_remote_hosts() -> Vec<String> {
    vec![r"googleapis\.com$".into(), r"gstatic\.com$".into(), "firebase".into()]
}

fn default_live_paths() -> Vec<String> {
    vec!["/api/".into()]
}

fn default_offline_url() -> String {
    "/offline".into()
}

fn default_refresh_interval_secs() -> u64 {
    3600
}

fn default_user_agent() -> String {
    "swproxy/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_install_concurrency() -> usize {
    4
}

fn default_notification_title() -> String {
    "Showroom +Roma".into()
}

fn default_notification_icon() -> String {
    "/icon.png".into()
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            cache_name: default_cache_name(),
            origin: default_origin(),
            essential_urls: default_essential_urls(),
            remote_hosts: default_remote_hosts(),
            live_paths: default_live_paths(),
            offline_url: default_offline_url(),
            image_placeholder_url: None,
            inline_image_placeholder: true,
            asset_unavailable_text: None,
            refresh_interval_secs: default_refresh_interval_secs(),
            network_timeout_ms: None,
            skip_waiting: true,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
            install_concurrency: default_install_concurrency(),
            notification_title: default_notification_title(),
            notification_icon: default_notification_icon(),
        }
    }
}

impl AppConfig {
    /// Network deadline, if one is configured.
    pub fn network_timeout(&self) -> Option<Duration> {
        self.network_timeout_ms.map(Duration::from_millis)
    }

    /// Refresh period, or `None` when the timer is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SWPROXY_`
    /// 2. TOML file from `SWPROXY_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed or
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SWPROXY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SWPROXY_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./swproxy-cache.sqlite"));
        assert_eq!(config.cache_name, "app-cache-v3");
        assert_eq!(config.offline_url, "/offline");
        assert!(config.essential_urls.contains(&"/manifest.json".to_string()));
        assert!(config.image_placeholder_url.is_none());
        assert!(config.inline_image_placeholder);
        assert!(config.asset_unavailable_text.is_none());
        assert!(config.network_timeout_ms.is_none());
        assert!(config.skip_waiting);
    }

    #[test]
    fn test_no_network_timeout_by_default() {
        assert_eq!(AppConfig::default().network_timeout(), None);
        let config = AppConfig { network_timeout_ms: Some(1500), ..Default::default() };
        assert_eq!(config.network_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_refresh_interval() {
        assert_eq!(AppConfig::default().refresh_interval(), Some(Duration::from_secs(3600)));
        let config = AppConfig { refresh_interval_secs: 0, ..Default::default() };
        assert_eq!(config.refresh_interval(), None);
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(
                r#"
                cache_name = "app-cache-v4"
                remote_hosts = ["auth\\.example\\.com$"]
                network_timeout_ms = 2500
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.cache_name, "app-cache-v4");
        assert_eq!(config.remote_hosts, vec![r"auth\.example\.com$".to_string()]);
        assert_eq!(config.network_timeout_ms, Some(2500));
        assert_eq!(config.offline_url, "/offline");
    }
}
