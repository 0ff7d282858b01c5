//! cache_stores tool implementation.

use pulse_core::StoreStats;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::controller::Worker;
use crate::tools::json_result;

/// Input parameters for the cache_stores tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresParams {
    /// Also list each store's entry URLs, oldest first (default: false).
    #[serde(default)]
    pub include_urls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreListing {
    #[serde(flatten)]
    pub stats: StoreStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Store owned by the running version.
    pub current: String,
    pub stores: Vec<StoreListing>,
}

pub async fn stores_impl(worker: &Worker, params: CacheStoresParams) -> Result<CallToolResult, McpError> {
    let mut stores = Vec::new();
    for stats in worker.db().store_stats().await? {
        let urls = if params.include_urls { Some(worker.db().entry_urls(&stats.name).await?) } else { None };
        stores.push(StoreListing { stats, urls });
    }
    json_result(&CacheStoresOutput { current: worker.store_name().to_string(), stores })
}
