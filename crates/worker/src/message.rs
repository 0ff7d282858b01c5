//! Commands pages post to the worker.

use pulse_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tagged by `type`, e.g. `{"type":"CACHE_URLS","urls":["/a.css"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    SkipWaiting,
    CacheUrls { urls: Vec<String> },
    ClearCache,
    GetVersion,
}

impl Message {
    pub fn parse(value: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::InvalidInput(format!("unrecognized message: {e}")))
    }
}
