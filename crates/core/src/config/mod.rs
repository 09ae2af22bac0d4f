//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
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
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache database, or `:memory:`.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Prefix shared by every cache generation name.
    ///
    /// Set via SHELLCACHE_NAMESPACE environment variable.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Build tag of the current generation.
    ///
    /// Set via SHELLCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Base URL that shell manifest paths are resolved against.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Resources that must be cached at install time.
    ///
    /// Set via SHELLCACHE_SHELL_MANIFEST environment variable (`[a, b]` syntax).
    #[serde(default = "default_shell_manifest")]
    pub shell_manifest: Vec<String>,

    /// Host served network-first.
    ///
    /// Set via SHELLCACHE_API_HOST environment variable.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Hosts served stale-while-revalidate.
    ///
    /// Set via SHELLCACHE_CDN_HOSTS environment variable (`[a, b]` syntax).
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,

    /// User-Agent string for upstream requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body bytes accepted from upstream.
    ///
    /// Set via SHELLCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_namespace() -> String {
    "spot-app".into()
}

fn default_version() -> String {
    "v1.0.0".into()
}

fn default_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_shell_manifest() -> Vec<String> {
    [
        "./",
        "./index.html",
        "./manifest.webmanifest",
        "./sw.js",
        "./icons/icon-192.png",
        "./icons/icon-512.png",
        "./icons/maskable-192.png",
        "./icons/maskable-512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_host() -> String {
    "api.awattar.at".into()
}

fn default_cdn_hosts() -> Vec<String> {
    vec!["cdn.jsdelivr.net".into()]
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            namespace: default_namespace(),
            version: default_version(),
            origin: default_origin(),
            shell_manifest: default_shell_manifest(),
            api_host: default_api_host(),
            cdn_hosts: default_cdn_hosts(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Name of the current cache generation: `<namespace>-<version>`.
    pub fn generation_name(&self) -> String {
        format!("{}-{}", self.namespace, self.version)
    }

    /// Whether the cache should live in memory instead of a file.
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == ":memory:"
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
