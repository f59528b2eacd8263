//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::canonical::{canonicalize, parse_origin};
use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty `cache_name` and
    /// `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `offline_url` or `image_placeholder_url` does not resolve against it
    /// - a `remote_hosts` entry is not a valid regex
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `network_timeout_ms` is set outside 100ms..=5 minutes
    /// - `install_concurrency` is outside 1..=16
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_name".into(),
                hint: "Set SWPROXY_CACHE_NAME to a versioned name such as app-cache-v3".into(),
            });
        }

        let origin = parse_origin(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;

        canonicalize(&origin, &self.offline_url).map_err(|e| invalid("offline_url", e.to_string()))?;

        if let Some(placeholder) = &self.image_placeholder_url {
            canonicalize(&origin, placeholder).map_err(|e| invalid("image_placeholder_url", e.to_string()))?;
        }

        for pattern in &self.remote_hosts {
            regex::Regex::new(pattern).map_err(|e| invalid("remote_hosts", format!("{pattern}: {e}")))?;
        }

        for path in &self.live_paths {
            if !path.starts_with('/') {
                return Err(invalid("live_paths", format!("{path}: must start with '/'")));
            }
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if let Some(timeout_ms) = self.network_timeout_ms {
            if timeout_ms < 100 {
                return Err(invalid("network_timeout_ms", "must be at least 100ms"));
            }
            if timeout_ms > 300_000 {
                return Err(invalid("network_timeout_ms", "must not exceed 5 minutes (300000ms)"));
            }
        }

        if !(1..=16).contains(&self.install_concurrency) {
            return Err(invalid("install_concurrency", "must be between 1 and 16"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.essential_urls.is_empty() {
            tracing::warn!(cache_name = %self.cache_name, "essential_urls is empty; nothing will be cached at install");
        }

        Ok(())
    }
}
