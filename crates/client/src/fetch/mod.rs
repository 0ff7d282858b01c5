//! HTTP implementation of the worker's fetch boundary.
//!
//! ### Behavior
//! - Any HTTP status is returned as a response; only transport failures
//!   (connect, DNS, timeout, oversized body) are errors.
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//!
//! ### Credentials
//! - `include`: forward `Cookie` and `Authorization` as given.
//! - `same-origin`: forward them only when the target shares the worker's origin.
//! - `omit`: always strip them.

pub mod url;

use bytes::Bytes;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pulse_core::{AppConfig, Credentials, Error, Network, Request, Response};

pub use self::url::{UrlError, resolve, same_origin};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "teampulse-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Origin used to decide `same-origin` credential forwarding.
    pub origin: Option<::url::Url>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "teampulse-sw/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            origin: None,
        }
    }
}

impl FetchConfig {
    /// Derive fetch settings from the application config.
    ///
    /// The transport timeout is left at its default; network-first applies
    /// its own, shorter budget on top.
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            origin: config.origin_url().ok(),
            ..Default::default()
        }
    }
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn forwards_credentials(&self, request: &Request) -> bool {
        match request.credentials {
            Credentials::Include => true,
            Credentials::Omit => false,
            Credentials::SameOrigin => self
                .config
                .origin
                .as_ref()
                .is_some_and(|origin| same_origin(origin, &request.url)),
        }
    }

    fn outgoing_headers(&self, request: &Request) -> header::HeaderMap {
        let mut headers = request.headers.clone();
        if !self.forwards_credentials(request) {
            headers.remove(header::COOKIE);
            headers.remove(header::AUTHORIZATION);
        }
        headers
    }

    /// Fetch a request, returning the buffered response.
    pub async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(self.outgoing_headers(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{}: {}", request.url, e))
                } else {
                    Error::Network(format!("{}: {}", request.url, e))
                }
            })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let headers = response.headers().clone();

        let bytes: Bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            url = %request.url,
            status = status.as_u16(),
            fetch_ms = start.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "fetched"
        );

        Ok(Response { status, headers, body: bytes })
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        FetchClient::fetch(self, request).await
    }
}
