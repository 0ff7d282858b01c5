//! MCP tool implementations.
//!
//! Each tool feeds one worker event through the dispatcher and reports the
//! resulting effects as JSON text content.

pub mod background;
pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;

pub use background::{NotificationClickParams, PushParams, SyncParams, notification_click_impl, push_impl, sync_impl};
pub use cache::{CacheGetParams, CacheStoresParams, get_impl, stores_impl};
pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl};
pub use message::{SwMessageParams, message_impl};

use pulse_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::events::Effect;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json =
        serde_json::to_string_pretty(output).map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

pub(crate) fn effect_names(effects: &[Effect]) -> Vec<String> {
    effects.iter().map(|e| e.name().to_string()).collect()
}

#[cfg(test)]
pub(crate) fn parse_output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
