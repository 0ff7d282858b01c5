//! Background sync delegate that notifies the backend to drain its queue.
//!
//! The worker only owns the trigger. Draining queued offline mutations is
//! the backend's job; this delegate asks it to do so and reports failure
//! so the platform retries.

use std::time::Duration;

use async_trait::async_trait;
use pulse_core::{Error, SyncDelegate};
use serde::Serialize;
use url::Url;

/// Default request timeout for sync calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SyncRequest<'a> {
    tag: &'a str,
    requested_at: String,
}

/// Posts `{tag, requested_at}` to a configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpSync {
    http: reqwest::Client,
    endpoint: Option<Url>,
}

impl HttpSync {
    /// Create a sync delegate. With no endpoint, syncs succeed without a call.
    pub fn new(endpoint: Option<Url>, user_agent: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl SyncDelegate for HttpSync {
    async fn sync(&self, tag: &str) -> Result<(), Error> {
        let Some(endpoint) = &self.endpoint else {
            tracing::info!(tag, "no sync endpoint configured; nothing to drain");
            return Ok(());
        };

        let body = SyncRequest { tag, requested_at: chrono::Utc::now().to_rfc3339() };
        let response = self
            .http
            .post(endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::SyncFailed(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SyncFailed(format!("{endpoint}: status {}", status.as_u16())));
        }

        tracing::debug!(tag, endpoint = %endpoint, "background sync delivered");
        Ok(())
    }
}
