//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use crate::request::{canonicalize, resolve};
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
    /// Returns `ConfigError::Missing` if namespace, version or api_host is
    /// empty, and `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - a `shell_manifest` path doesn't resolve against `origin`
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value, hint) in [
            ("namespace", &self.namespace, "Set SHELLCACHE_NAMESPACE"),
            ("version", &self.version, "Set SHELLCACHE_VERSION"),
            ("api_host", &self.api_host, "Set SHELLCACHE_API_HOST"),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { field: field.into(), hint: hint.into() });
            }
        }

        if !self.origin.contains("://") {
            return Err(invalid("origin", "must be an absolute URL"));
        }
        let origin = canonicalize(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;

        for path in &self.shell_manifest {
            resolve(&origin, path).map_err(|e| invalid("shell_manifest", format!("{path}: {e}")))?;
        }
        if self.shell_manifest.is_empty() {
            tracing::warn!("shell_manifest is empty; install will create an empty generation");
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.cdn_hosts.iter().any(|h| h.eq_ignore_ascii_case(&self.api_host)) {
            tracing::warn!(
                api_host = %self.api_host,
                "api_host is also listed in cdn_hosts; requests to it are routed network-first"
            );
        }

        Ok(())
    }
}
