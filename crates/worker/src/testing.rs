//! Scripted collaborators for worker tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use pulse_core::{Error, Network, Request, Response, SyncDelegate};
use url::Url;

/// Serves canned responses by URL; unknown URLs get a 404.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        let network = Self::default();
        network.set_offline(true);
        network
    }

    pub fn respond(&self, url: Url, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{}: connection refused", request.url)));
        }

        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")))
    }
}

/// Records sync tags; fails every call when `failing` is set.
#[derive(Default)]
pub struct MockSync {
    pub tags: Mutex<Vec<String>>,
    pub failing: AtomicBool,
}

impl MockSync {
    pub fn failing() -> Self {
        let sync = Self::default();
        sync.failing.store(true, Ordering::SeqCst);
        sync
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncDelegate for MockSync {
    async fn sync(&self, tag: &str) -> Result<(), Error> {
        self.tags.lock().unwrap().push(tag.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SyncFailed(format!("{tag}: upstream unavailable")));
        }
        Ok(())
    }
}
