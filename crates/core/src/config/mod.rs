//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PULSE_SW_*)
//! 2. TOML config file (if PULSE_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::strategy::Strategy;

mod validation;

pub use validation::ConfigError;

/// Forces a strategy for every request whose path starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOverride {
    pub prefix: String,
    pub strategy: Strategy,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PULSE_SW_*)
/// 2. TOML config file (if PULSE_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite cache store.
    ///
    /// Set via PULSE_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the worker is scoped to; precache paths resolve against it.
    ///
    /// Set via PULSE_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Store name prefix. The current store is `<cache_prefix>-<version>`.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deployed version identifier. Bumping it invalidates every older store
    /// on the next activation.
    ///
    /// Set via PULSE_SW_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Path prefix for backend API calls (served network-first).
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Network-first time budget in milliseconds.
    #[serde(default = "default_network_timeout_ms")]
    pub network_timeout_ms: u64,

    /// User-Agent string for worker-initiated requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body bytes accepted from the network.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Same-origin paths fetched into the store at install time.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Cached page served to navigations when both network and cache miss.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Human-readable message embedded in the synthetic offline body.
    #[serde(default = "default_offline_message")]
    pub offline_message: String,

    /// Product name, used as the default notification title.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,

    #[serde(default = "default_notification_badge")]
    pub notification_badge: String,

    /// Background sync tag that triggers the sync delegate.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Endpoint (path or absolute URL) the sync delegate posts to.
    ///
    /// Set via PULSE_SW_SYNC_ENDPOINT environment variable.
    #[serde(default)]
    pub sync_endpoint: Option<String>,

    /// Per-prefix strategy overrides, evaluated before the built-in rules.
    #[serde(default)]
    pub route_overrides: Vec<RouteOverride>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./teampulse-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_prefix() -> String {
    "teampulse".into()
}

fn default_version() -> String {
    "v1".into()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_network_timeout_ms() -> u64 {
    3_000
}

fn default_user_agent() -> String {
    "teampulse-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/offline.html",
        "/css/styles.css",
        "/js/app.js",
        "/js/offline-sync.js",
        "/manifest.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_offline_message() -> String {
    "You are currently offline. Please check your connection and try again.".into()
}

fn default_app_name() -> String {
    "TeamPulse".into()
}

fn default_notification_icon() -> String {
    "/icons/icon-192x192.png".into()
}

fn default_notification_badge() -> String {
    "/icons/badge-72x72.png".into()
}

fn default_sync_tag() -> String {
    "sync-data".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            api_prefix: default_api_prefix(),
            network_timeout_ms: default_network_timeout_ms(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            precache_urls: default_precache_urls(),
            offline_page: default_offline_page(),
            offline_message: default_offline_message(),
            app_name: default_app_name(),
            notification_icon: default_notification_icon(),
            notification_badge: default_notification_badge(),
            sync_tag: default_sync_tag(),
            sync_endpoint: None,
            route_overrides: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Network-first budget as Duration for use with tokio.
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_timeout_ms)
    }

    /// Name of the store owned by this version.
    pub fn store_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.version)
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") }),
        }
    }

    /// Resolve `sync_endpoint` against the origin.
    ///
    /// A path such as `/api/sync` joins onto the origin; an absolute URL is
    /// kept as-is. Either way the result must be http(s).
    pub fn sync_endpoint_url(&self) -> Result<Option<Url>, ConfigError> {
        let Some(endpoint) = self.sync_endpoint.as_deref() else {
            return Ok(None);
        };
        let invalid = |reason: String| ConfigError::Invalid { field: "sync_endpoint".into(), reason };

        let url = self.origin_url()?.join(endpoint).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Some(url)),
            scheme => Err(invalid(format!("unsupported scheme: {scheme}"))),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PULSE_SW_`
    /// 2. TOML file from `PULSE_SW_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("PULSE_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PULSE_SW_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
