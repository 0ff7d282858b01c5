//! Per-request strategy selection.
//!
//! Evaluation order:
//! 1. Configured route overrides, first matching prefix wins
//! 2. Paths under the API prefix use network-first
//! 3. Static asset extensions use cache-first
//! 4. Requests accepting HTML use stale-while-revalidate
//! 5. Everything else uses network-first

use http::Method;
use pulse_core::{AppConfig, Request, RouteOverride, Strategy};

/// File extensions served cache-first.
pub const STATIC_EXTENSIONS: [&str; 8] = ["css", "js", "png", "jpg", "jpeg", "svg", "woff", "woff2"];

#[derive(Debug, Clone)]
pub struct Classifier {
    api_prefix: String,
    overrides: Vec<RouteOverride>,
}

impl Classifier {
    pub fn new(api_prefix: impl Into<String>, overrides: Vec<RouteOverride>) -> Self {
        Self { api_prefix: api_prefix.into(), overrides }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_prefix.clone(), config.route_overrides.clone())
    }

    /// Pick a strategy, or `None` when the request is not intercepted at all.
    pub fn classify(&self, request: &Request) -> Option<Strategy> {
        if !intercepts(request) {
            return None;
        }

        let path = request.url.path();

        if let Some(route) = self.overrides.iter().find(|r| path.starts_with(&r.prefix)) {
            return Some(route.strategy);
        }

        if path.starts_with(&self.api_prefix) {
            return Some(Strategy::NetworkFirst);
        }

        if let Some(ext) = extension(path)
            && STATIC_EXTENSIONS.contains(&ext.as_str())
        {
            return Some(Strategy::CacheFirst);
        }

        if request.accept().is_some_and(|accept| accept.contains("text/html")) {
            return Some(Strategy::StaleWhileRevalidate);
        }

        Some(Strategy::NetworkFirst)
    }
}

/// Only GET requests over http(s) are ever handled by the worker.
pub fn intercepts(request: &Request) -> bool {
    request.method == Method::GET && request.is_http()
}

/// Lowercased extension of the last path segment.
fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
