//! Precache and eviction routines behind install, activate and `CACHE_URLS`.

use std::sync::Arc;

use pulse_core::{CacheDb, CacheEntry, Credentials, Error, Network, Request};
use tokio::task::JoinSet;
use url::Url;

/// Fetch every URL and commit them to `store` in one transaction.
///
/// Nothing is written unless every fetch returns 2xx. The first failure
/// aborts the remaining fetches and is returned as `PrecacheFailed`.
pub async fn precache(db: &CacheDb, network: &Arc<dyn Network>, store: &str, urls: &[Url]) -> Result<usize, Error> {
    let mut fetches = JoinSet::new();
    for (index, url) in urls.iter().enumerate() {
        let network = Arc::clone(network);
        let request = Request::get(url.clone()).with_credentials(Credentials::Include);
        fetches.spawn(async move {
            let result = network.fetch(&request).await;
            (index, request, result)
        });
    }

    let mut fetched = Vec::with_capacity(urls.len());
    while let Some(joined) = fetches.join_next().await {
        let (index, request, result) =
            joined.map_err(|e| Error::PrecacheFailed { url: "<task>".to_string(), reason: e.to_string() })?;

        let response = result.map_err(|e| Error::PrecacheFailed { url: request.url.to_string(), reason: e.to_string() })?;
        if !response.is_success() {
            return Err(Error::PrecacheFailed {
                url: request.url.to_string(),
                reason: format!("status {}", response.status.as_u16()),
            });
        }

        fetched.push((index, CacheEntry::from_response(&request, &response)));
    }

    fetched.sort_by_key(|(index, _)| *index);
    let entries: Vec<CacheEntry> = fetched.into_iter().map(|(_, entry)| entry).collect();

    db.put_entries(store, &entries).await?;
    tracing::info!(store, entries = entries.len(), "precache committed");
    Ok(entries.len())
}

/// Delete every store except `current`, returning what was removed.
pub async fn evict_stale(db: &CacheDb, current: &str) -> Result<Vec<String>, Error> {
    let deleted = db.delete_stores_except(current).await?;
    for name in &deleted {
        tracing::info!(store = %name, current, "deleted stale cache store");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNetwork;
    use http::StatusCode;
    use pulse_core::Response;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://app.teampulse.test{path}")).unwrap()
    }

    fn network_with(paths: &[&str]) -> Arc<MockNetwork> {
        let network = Arc::new(MockNetwork::new());
        for path in paths {
            network.respond(url(path), Response::new(StatusCode::OK, format!("content of {path}")));
        }
        network
    }

    #[tokio::test]
    async fn test_precache_commits_all() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = network_with(&["/", "/app.css"]);

        let count = precache(&db, &network, "teampulse-v1", &[url("/"), url("/app.css")]).await.unwrap();
        assert_eq!(count, 2);

        let hit = db.match_entry("teampulse-v1", "GET", &url("/app.css")).await.unwrap().unwrap();
        assert_eq!(hit.body, b"content of /app.css");
    }

    #[tokio::test]
    async fn test_precache_is_all_or_nothing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = network_with(&["/", "/app.css"]);

        let result = precache(&db, &network, "teampulse-v2", &[url("/"), url("/app.css"), url("/missing.js")]).await;
        assert!(matches!(result, Err(Error::PrecacheFailed { ref url, ref reason }) if url.ends_with("/missing.js") && reason == "status 404"));
        assert!(!db.has_store("teampulse-v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_precache_network_failure() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(MockNetwork::offline());

        let result = precache(&db, &network, "teampulse-v1", &[url("/")]).await;
        assert!(matches!(result, Err(Error::PrecacheFailed { .. })));
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_precache_empty_creates_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = Arc::new(MockNetwork::new());

        assert_eq!(precache(&db, &network, "teampulse-v1", &[]).await.unwrap(), 0);
        assert!(db.has_store("teampulse-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_evict_stale_keeps_current() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let network: Arc<dyn Network> = network_with(&["/"]);
        precache(&db, &network, "teampulse-v1", &[url("/")]).await.unwrap();
        precache(&db, &network, "teampulse-v2", &[url("/")]).await.unwrap();

        let deleted = evict_stale(&db, "teampulse-v2").await.unwrap();
        assert_eq!(deleted, vec!["teampulse-v1".to_string()]);
        assert!(db.match_entry("teampulse-v2", "GET", &url("/")).await.unwrap().is_some());
    }
}
