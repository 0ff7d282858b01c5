//! sw_push, sw_sync and sw_notification_click tool implementations.

use bytes::Bytes;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::controller::Worker;
use crate::events::{Effect, Event};
use crate::push::Notification;

/// Input parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PushParams {
    /// Raw push payload text; usually JSON with `title`, `message` and `data`.
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PushOutput {
    pub notification: Option<Notification>,
}

/// Input parameters for the sw_sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SyncParams {
    /// Sync tag (default: the configured sync tag).
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncOutput {
    pub tag: String,
    /// False when the tag is not one the worker registers.
    pub handled: bool,
}

/// Input parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickParams {
    /// The clicked action (`open` or `close`), absent for a body click.
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NotificationClickOutput {
    pub closed: bool,
    pub open_window: Option<String>,
}

pub async fn push_impl(worker: &Worker, params: PushParams) -> Result<CallToolResult, McpError> {
    let payload = params.payload.map(Bytes::from);
    let effects = worker.dispatch(Event::Push(payload)).await?;

    let notification = effects.into_iter().find_map(|e| match e {
        Effect::ShowNotification(n) => Some(n),
        _ => None,
    });
    json_result(&PushOutput { notification })
}

pub async fn sync_impl(worker: &Worker, params: SyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.unwrap_or_else(|| worker.config().sync_tag.clone());
    let handled = tag == worker.config().sync_tag;

    worker.dispatch(Event::Sync { tag: tag.clone() }).await?;
    json_result(&SyncOutput { tag, handled })
}

pub async fn notification_click_impl(
    worker: &Worker, params: NotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let effects = worker.dispatch(Event::NotificationClick { action: params.action }).await?;

    let closed = effects.contains(&Effect::CloseNotification);
    let open_window = effects.into_iter().find_map(|e| match e {
        Effect::OpenWindow(url) => Some(url.to_string()),
        _ => None,
    });
    json_result(&NotificationClickOutput { closed, open_window })
}
