//! Strategy execution against the current store and the network.
//!
//! Store read failures count as misses and store write failures are logged;
//! neither ever replaces the response a strategy would otherwise return.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::{CacheDb, CacheEntry, Error, Network, Request, Response, Strategy};
use url::Url;

use crate::offline::offline_response;
use crate::refresh::Refreshes;

/// Everything a strategy handler needs. Cheap to clone into refresh tasks.
#[derive(Clone)]
pub struct StrategyContext {
    pub db: CacheDb,
    pub network: Arc<dyn Network>,
    pub store: String,
    pub offline_page: Url,
    pub offline_message: String,
    pub network_timeout: Duration,
}

impl StrategyContext {
    async fn cached(&self, request: &Request) -> Option<Response> {
        self.cached_url(request.method.as_str(), &request.url).await
    }

    async fn cached_url(&self, method: &str, url: &Url) -> Option<Response> {
        let entry = match self.db.match_entry(&self.store, method, url).await {
            Ok(entry) => entry?,
            Err(e) => {
                tracing::warn!(url = %url, store = %self.store, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };

        match entry.to_response() {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(url = %url, store = %self.store, error = %e, "unreadable cache entry; treating as miss");
                None
            }
        }
    }

    async fn store(&self, request: &Request, response: &Response) {
        if !response.is_success() {
            tracing::debug!(url = %request.url, status = response.status.as_u16(), "not caching non-2xx response");
            return;
        }

        let entry = CacheEntry::from_response(request, response);
        if let Err(e) = self.db.put_entry(&self.store, &entry).await {
            tracing::warn!(url = %request.url, store = %self.store, error = %e, "cache write failed");
        }
    }

    async fn fetch_within_budget(&self, request: &Request) -> Result<Response, Error> {
        match tokio::time::timeout(self.network_timeout, self.network.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::FetchTimeout(format!(
                "{}: no response within {}ms",
                request.url,
                self.network_timeout.as_millis()
            ))),
        }
    }

    fn offline(&self) -> Response {
        offline_response(&self.offline_message)
    }
}

/// Serve `request` with `strategy`. Always yields a response.
pub async fn execute(strategy: Strategy, ctx: &StrategyContext, refreshes: &Refreshes, request: &Request) -> Response {
    match strategy {
        Strategy::CacheFirst => cache_first(ctx, request).await,
        Strategy::NetworkFirst => network_first(ctx, request).await,
        Strategy::StaleWhileRevalidate => stale_while_revalidate(ctx, refreshes, request).await,
        Strategy::CacheOnly => cache_only(ctx, request).await,
        Strategy::NetworkOnly => network_only(ctx, request).await,
    }
}

async fn cache_first(ctx: &StrategyContext, request: &Request) -> Response {
    if let Some(hit) = ctx.cached(request).await {
        tracing::debug!(url = %request.url, strategy = "cache-first", "cache hit");
        return hit;
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store(request, &response).await;
            response
        }
        Err(e) => {
            tracing::warn!(url = %request.url, strategy = "cache-first", error = %e, "network failed with no cached entry");
            ctx.offline()
        }
    }
}

async fn network_first(ctx: &StrategyContext, request: &Request) -> Response {
    let error = match ctx.fetch_within_budget(request).await {
        Ok(response) => {
            ctx.store(request, &response).await;
            return response;
        }
        Err(e) => e,
    };

    tracing::warn!(url = %request.url, strategy = "network-first", error = %error, "network failed; trying cache");

    if let Some(hit) = ctx.cached(request).await {
        return hit;
    }

    if request.is_navigation()
        && let Some(page) = ctx.cached_url("GET", &ctx.offline_page).await
    {
        tracing::debug!(url = %request.url, offline_page = %ctx.offline_page, "serving cached offline page");
        return page;
    }

    ctx.offline()
}

async fn stale_while_revalidate(ctx: &StrategyContext, refreshes: &Refreshes, request: &Request) -> Response {
    if let Some(hit) = ctx.cached(request).await {
        let ctx = ctx.clone();
        let request = request.clone();
        refreshes
            .spawn(async move {
                match ctx.network.fetch(&request).await {
                    Ok(response) => ctx.store(&request, &response).await,
                    Err(e) => {
                        tracing::warn!(url = %request.url, strategy = "stale-while-revalidate", error = %e, "background refresh failed")
                    }
                }
            })
            .await;
        return hit;
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store(request, &response).await;
            response
        }
        Err(e) => {
            tracing::warn!(url = %request.url, strategy = "stale-while-revalidate", error = %e, "network failed with no cached entry");
            ctx.offline()
        }
    }
}

async fn cache_only(ctx: &StrategyContext, request: &Request) -> Response {
    match ctx.cached(request).await {
        Some(hit) => hit,
        None => {
            tracing::debug!(url = %request.url, strategy = "cache-only", "cache miss");
            ctx.offline()
        }
    }
}

async fn network_only(ctx: &StrategyContext, request: &Request) -> Response {
    match ctx.network.fetch(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url = %request.url, strategy = "network-only", error = %e, "network failed");
            ctx.offline()
        }
    }
}
