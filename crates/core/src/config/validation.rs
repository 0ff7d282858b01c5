//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn require_path(field: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Invalid { field: field.into(), reason: format!("'{value}' must start with '/'") });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version`, `cache_prefix`, `user_agent` or `sync_tag` is empty
    /// - `version` contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `sync_endpoint` does not resolve against the origin to an http(s) URL
    /// - `api_prefix`, `offline_page`, a precache entry or a route prefix
    ///   is not an absolute path
    /// - `network_timeout_ms` is below 100ms or above 60s
    /// - `max_bytes` is 0 or exceeds 50MB
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.is_empty() {
            return Err(ConfigError::Invalid { field: "version".into(), reason: "must not be empty".into() });
        }
        if self.version.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid { field: "version".into(), reason: "must not contain whitespace".into() });
        }
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_prefix".into(), reason: "must not be empty".into() });
        }

        self.origin_url()?;
        self.sync_endpoint_url()?;

        require_path("api_prefix", &self.api_prefix)?;
        require_path("offline_page", &self.offline_page)?;
        for path in &self.precache_urls {
            require_path("precache_urls", path)?;
        }
        for route in &self.route_overrides {
            require_path("route_overrides", &route.prefix)?;
        }

        if self.network_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "network_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.network_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "network_timeout_ms".into(),
                reason: "must not exceed 60 seconds (60000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }
        if self.sync_tag.is_empty() {
            return Err(ConfigError::Invalid { field: "sync_tag".into(), reason: "must not be empty".into() });
        }

        if !self.precache_urls.iter().any(|p| p == &self.offline_page) {
            tracing::warn!(
                offline_page = %self.offline_page,
                "offline_page is not in precache_urls; navigations may fall back to the synthetic response"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteOverride;
    use crate::strategy::Strategy;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_version() {
        let config = AppConfig { version: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "version"));
    }

    #[test]
    fn test_validate_version_whitespace() {
        let config = AppConfig { version: "v 2".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "version"));
    }

    #[test]
    fn test_validate_bad_origin() {
        let config = AppConfig { origin: "not a url".into(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "origin"));
    }

    #[test]
    fn test_validate_relative_precache_entry() {
        let config = AppConfig { precache_urls: vec!["app.css".into()], ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "precache_urls"));
    }

    #[test]
    fn test_validate_relative_route_prefix() {
        let config = AppConfig {
            route_overrides: vec![RouteOverride { prefix: "reports".into(), strategy: Strategy::CacheOnly }],
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "route_overrides"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { network_timeout_ms: 50, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "network_timeout_ms"));

        let config = AppConfig { network_timeout_ms: 60_001, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "network_timeout_ms"));

        let config = AppConfig { network_timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));

        let config = AppConfig { max_bytes: 51 * 1024 * 1024, ..Default::default() }; // 51MB
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_empty_sync_tag() {
        let config = AppConfig { sync_tag: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "sync_tag"));
    }

    #[test]
    fn test_validate_sync_endpoint_path() {
        let config = AppConfig {
            origin: "https://app.teampulse.test".into(),
            sync_endpoint: Some("/api/sync".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let url = config.sync_endpoint_url().unwrap().unwrap();
        assert_eq!(url.as_str(), "https://app.teampulse.test/api/sync");
    }

    #[test]
    fn test_validate_sync_endpoint_absolute() {
        let config = AppConfig { sync_endpoint: Some("https://sync.teampulse.test/in".into()), ..Default::default() };
        assert!(config.validate().is_ok());
        let url = config.sync_endpoint_url().unwrap().unwrap();
        assert_eq!(url.as_str(), "https://sync.teampulse.test/in");

        let config = AppConfig::default();
        assert!(config.sync_endpoint_url().unwrap().is_none());
    }

    #[test]
    fn test_validate_sync_endpoint_scheme() {
        let config = AppConfig { sync_endpoint: Some("ftp://files.teampulse.test/drop".into()), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "sync_endpoint"));
    }
}
