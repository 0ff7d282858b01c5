//! cache_get tool implementation.
//!
//! Retrieves the entry the current store holds for a request.

use pulse_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::controller::Worker;
use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL or path relative to the worker's origin.
    pub url: String,

    /// Request method the entry was stored under (default: GET).
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(worker: &Worker, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let method = params.method.trim().to_uppercase();

    let entry = worker
        .db()
        .match_entry(worker.store_name(), &method, &url)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{method} {url}")))?;

    let output = CacheGetOutput {
        store: worker.store_name().to_string(),
        body: String::from_utf8_lossy(&entry.body).into_owned(),
        key_hash: entry.key_hash,
        method: entry.method,
        url: entry.url,
        status: entry.status,
        headers: entry.headers,
        stored_at: entry.stored_at,
    };
    json_result(&output)
}
