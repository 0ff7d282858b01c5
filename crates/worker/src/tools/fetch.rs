//! sw_fetch tool implementation.
//!
//! Simulates a page fetch through the worker and reports how it was served.

use std::collections::BTreeMap;

use http::Method;
use http::header::{self, HeaderName};
use pulse_core::{Credentials, Error, Request, RequestMode, Strategy};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::controller::Worker;
use crate::events::{Effect, Event};
use crate::offline::is_offline_response;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL or path relative to the worker's origin.
    pub url: String,

    /// HTTP method (default: GET). Only GET is intercepted.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode. "navigate" also supplies an HTML Accept header.
    #[serde(default)]
    pub mode: RequestMode,

    #[serde(default)]
    pub credentials: Credentials,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    /// False when the worker let the request pass through to the network.
    pub intercepted: bool,
    pub strategy: Option<Strategy>,
    pub status: Option<u16>,
    /// Whether the response is the synthesized offline response.
    pub offline: bool,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

fn build_request(worker: &Worker, params: &SwFetchParams) -> Result<Request, Error> {
    let url = worker.resolve(&params.url)?;
    let method = Method::from_bytes(params.method.trim().to_uppercase().as_bytes())
        .map_err(|e| Error::InvalidInput(format!("invalid method {:?}: {e}", params.method)))?;

    let base = match params.mode {
        RequestMode::Navigate => Request::navigate(url),
        mode => Request::get(url).with_mode(mode),
    };

    let mut request = base.with_method(method).with_credentials(params.credentials);
    for (name, value) in &params.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid header name {name:?}: {e}")))?;
        if name == header::ACCEPT {
            request.headers.remove(header::ACCEPT);
        }
        request = request.with_header(name, value);
    }
    Ok(request)
}

pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;
    let url = request.url.to_string();

    let effects = worker.dispatch(Event::Fetch(request)).await?;

    let output = match effects.into_iter().next() {
        Some(Effect::Respond { strategy, response }) => SwFetchOutput {
            url,
            intercepted: true,
            strategy: Some(strategy),
            status: Some(response.status.as_u16()),
            offline: is_offline_response(&response),
            content_type: response.content_type().map(str::to_string),
            headers: response.header_pairs(),
            body: Some(String::from_utf8_lossy(&response.body).into_owned()),
        },
        _ => SwFetchOutput {
            url,
            intercepted: false,
            strategy: None,
            status: None,
            offline: false,
            content_type: None,
            headers: vec![],
            body: None,
        },
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::{url, worker};
    use crate::testing::{MockNetwork, MockSync};
    use crate::tools::{install_impl, parse_output};
    use http::StatusCode;
    use pulse_core::{AppConfig, Response};
    use std::sync::Arc;

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams {
            url: url.to_string(),
            method: default_method(),
            mode: RequestMode::default(),
            credentials: Credentials::default(),
            headers: BTreeMap::new(),
        }
    }

    async fn active_worker(network: Arc<MockNetwork>) -> Worker {
        let config = AppConfig {
            origin: "https://app.teampulse.test".into(),
            precache_urls: vec!["/app.css".into()],
            ..Default::default()
        };
        network.respond(url("/app.css"), Response::new(StatusCode::OK, "body{}"));
        let worker = worker(config, network, Arc::new(MockSync::default())).await;
        install_impl(&worker).await.unwrap();
        worker
    }

    #[tokio::test]
    async fn test_fetch_static_offline_from_cache() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;
        network.set_offline(true);

        let result = fetch_impl(&worker, params("/app.css")).await.unwrap();
        let output: SwFetchOutput = parse_output(&result);
        assert!(output.intercepted);
        assert_eq!(output.strategy, Some(Strategy::CacheFirst));
        assert_eq!(output.status, Some(200));
        assert_eq!(output.body.as_deref(), Some("body{}"));
    }

    #[tokio::test]
    async fn test_fetch_api_offline() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network.clone()).await;
        network.set_offline(true);

        let result = fetch_impl(&worker, params("/api/v1/clients")).await.unwrap();
        let output: SwFetchOutput = parse_output(&result);
        assert_eq!(output.strategy, Some(Strategy::NetworkFirst));
        assert_eq!(output.status, Some(503));
        assert!(output.offline);
        assert_eq!(output.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let network = Arc::new(MockNetwork::new());
        let worker = active_worker(network).await;

        let result = fetch_impl(&worker, SwFetchParams { method: "post".into(), ..params("/api/v1/clients") })
            .await
            .unwrap();
        let output: SwFetchOutput = parse_output(&result);
        assert!(!output.intercepted);
        assert!(output.strategy.is_none());
    }

    #[tokio::test]
    async fn test_fetch_navigate_uses_swr() {
        let network = Arc::new(MockNetwork::new());
        network.respond(url("/dashboard"), Response::new(StatusCode::OK, "<html>dash</html>"));
        let worker = active_worker(network).await;

        let result = fetch_impl(&worker, SwFetchParams { mode: RequestMode::Navigate, ..params("/dashboard") })
            .await
            .unwrap();
        let output: SwFetchOutput = parse_output(&result);
        assert_eq!(output.strategy, Some(Strategy::StaleWhileRevalidate));
        assert_eq!(output.body.as_deref(), Some("<html>dash</html>"));
    }

    #[tokio::test]
    async fn test_fetch_invalid_header() {
        let worker = active_worker(Arc::new(MockNetwork::new())).await;
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());

        let err = fetch_impl(&worker, SwFetchParams { headers, ..params("/") }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
