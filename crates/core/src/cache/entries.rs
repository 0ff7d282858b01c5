//! Cache entry operations.
//!
//! An entry is an immutable snapshot of a response stored under a request
//! identity inside a named store. Entries are only ever replaced whole,
//! never patched, so an interrupted write cannot leave a half-updated entry.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use crate::fetch::{Request, Response};
use bytes::Bytes;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Connection, OptionalExtension};
use url::Url;

/// A stored response snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheEntry {
    /// Snapshot `response` as the answer to `request`.
    pub fn from_response(request: &Request, response: &Response) -> Self {
        Self {
            key_hash: compute_cache_key(request.method.as_str(), &request.url),
            method: request.method.as_str().to_string(),
            url: request.url.as_str().to_string(),
            status: response.status.as_u16(),
            headers: response.header_pairs(),
            body: response.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Rebuild the response this entry was captured from.
    pub fn to_response(&self) -> Result<Response, Error> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| Error::CorruptEntry(format!("{}: status {}: {e}", self.url, self.status)))?;
        Ok(Response {
            status,
            headers: Response::headers_from_pairs(&self.headers),
            body: Bytes::from(self.body.clone()),
        })
    }
}

fn insert_entry(conn: &Connection, store: &str, entry: &CacheEntry, headers_json: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (store, key_hash, method, url, status, headers_json, body, stored_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(store, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.status as i64,
            headers_json,
            &entry.body,
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Insert or replace an entry, creating the store if absent.
    pub async fn put_entry(&self, store: &str, entry: &CacheEntry) -> Result<(), Error> {
        self.put_entries(store, std::slice::from_ref(entry)).await
    }

    /// Insert or replace several entries in one transaction.
    ///
    /// Either the store (created if absent) and every entry are committed,
    /// or nothing is.
    pub async fn put_entries(&self, store: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        let store = store.to_string();
        let rows = entries
            .iter()
            .map(|entry| Ok((entry.clone(), serde_json::to_string(&entry.headers)?)))
            .collect::<Result<Vec<_>, Error>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![&store, chrono::Utc::now().to_rfc3339()],
                )?;
                for (entry, headers_json) in &rows {
                    insert_entry(&tx, &store, entry, headers_json)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for a request identity.
    ///
    /// Returns None if the store or the entry doesn't exist.
    pub async fn match_entry(&self, store: &str, method: &str, url: &Url) -> Result<Option<CacheEntry>, Error> {
        let store = store.to_string();
        let key_hash = compute_cache_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let row = conn
                    .query_row(
                        "SELECT key_hash, method, url, status, headers_json, body, stored_at
                        FROM entries WHERE store = ?1 AND key_hash = ?2",
                        params![store, key_hash],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, i64>(3)?,
                                row.get::<_, String>(4)?,
                                row.get::<_, Vec<u8>>(5)?,
                                row.get::<_, String>(6)?,
                            ))
                        },
                    )
                    .optional()?;

                let Some((key_hash, method, url, status, headers_json, body, stored_at)) = row else {
                    return Ok(None);
                };

                let status = u16::try_from(status).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
                let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;

                Ok(Some(CacheEntry { key_hash, method, url, status, headers, body, stored_at }))
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of every entry in a store, oldest first.
    pub async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE store = ?1 ORDER BY stored_at ASC, url ASC")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, HeaderValue};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn make_entry(path: &str, body: &str) -> CacheEntry {
        let request = Request::get(url(&format!("https://app.example.com{path}")));
        let response = Response::new(StatusCode::OK, body.to_string())
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/css"));
        CacheEntry::from_response(&request, &response)
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("/app.css", "body { color: red }");

        db.put_entry("teampulse-v1", &entry).await.unwrap();

        let found = db
            .match_entry("teampulse-v1", "GET", &url("https://app.example.com/app.css"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, entry);

        let response = found.to_response().unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("text/css"));
        assert_eq!(&response.body[..], b"body { color: red }");
    }

    #[tokio::test]
    async fn test_put_creates_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.has_store("teampulse-v1").await.unwrap());

        db.put_entry("teampulse-v1", &make_entry("/", "<html>")).await.unwrap();
        assert!(db.has_store("teampulse-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db
            .match_entry("teampulse-v1", "GET", &url("https://app.example.com/missing.js"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_match_is_scoped_to_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("teampulse-v1", &make_entry("/app.css", "old")).await.unwrap();

        let result = db
            .match_entry("teampulse-v2", "GET", &url("https://app.example.com/app.css"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("teampulse-v1", &make_entry("/app.css", "v1")).await.unwrap();
        db.put_entry("teampulse-v1", &make_entry("/app.css", "v2")).await.unwrap();

        let found = db
            .match_entry("teampulse-v1", "GET", &url("https://app.example.com/app.css"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.body, b"v2");
        assert_eq!(db.entry_urls("teampulse-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_entries_commits_all() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![make_entry("/", "<html>"), make_entry("/app.css", "css")];

        db.put_entries("teampulse-v1", &entries).await.unwrap();

        let urls = db.entry_urls("teampulse-v1").await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"https://app.example.com/app.css".to_string()));
    }

    #[tokio::test]
    async fn test_put_entries_empty_still_creates_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entries("teampulse-v1", &[]).await.unwrap();
        assert!(db.has_store("teampulse-v1").await.unwrap());
        assert!(db.entry_urls("teampulse-v1").await.unwrap().is_empty());
    }

    #[test]
    fn test_to_response_rejects_bad_status() {
        let mut entry = make_entry("/app.css", "css");
        entry.status = 42;
        assert!(matches!(entry.to_response(), Err(Error::CorruptEntry(_))));
    }
}
