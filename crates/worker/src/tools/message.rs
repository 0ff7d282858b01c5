//! sw_message tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::lifecycle::activate_if_ready;
use super::{effect_names, json_result};
use crate::controller::Worker;
use crate::events::{Effect, Event};
use crate::message::Message;

/// Input parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message posted by a page, e.g. `{"type":"GET_VERSION"}`.
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    pub effects: Vec<String>,
    /// Reply sent back to the posting page, if any.
    pub reply: Option<serde_json::Value>,
    /// Whether a skip-waiting request led to an immediate activation.
    pub activated: bool,
}

pub async fn message_impl(worker: &Worker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let message = Message::parse(params.message)?;
    let effects = worker.dispatch(Event::Message(message)).await?;

    let reply = effects.iter().find_map(|e| match e {
        Effect::Reply(value) => Some(value.clone()),
        _ => None,
    });
    let mut names = effect_names(&effects);

    let mut activated = false;
    if effects.contains(&Effect::SkipWaiting)
        && let Some(more) = activate_if_ready(worker).await?
    {
        names.extend(more);
        activated = true;
    }

    json_result(&SwMessageOutput { effects: names, reply, activated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::tests::worker;
    use crate::testing::{MockNetwork, MockSync};
    use crate::tools::parse_output;
    use pulse_core::AppConfig;
    use serde_json::json;
    use std::sync::Arc;

    async fn idle_worker() -> Worker {
        let config = AppConfig { origin: "https://app.teampulse.test".into(), ..Default::default() };
        worker(config, Arc::new(MockNetwork::new()), Arc::new(MockSync::default())).await
    }

    #[tokio::test]
    async fn test_get_version() {
        let worker = idle_worker().await;
        let result = message_impl(&worker, SwMessageParams { message: json!({"type": "GET_VERSION"}) })
            .await
            .unwrap();
        let output: SwMessageOutput = parse_output(&result);
        assert_eq!(output.reply, Some(json!({"version": "v1"})));
        assert_eq!(output.effects, vec!["reply"]);
    }

    #[tokio::test]
    async fn test_skip_waiting_before_install_does_not_activate() {
        let worker = idle_worker().await;
        let result = message_impl(&worker, SwMessageParams { message: json!({"type": "SKIP_WAITING"}) })
            .await
            .unwrap();
        let output: SwMessageOutput = parse_output(&result);
        assert!(!output.activated);
        assert!(worker.state().await.skip_waiting);
    }

    #[tokio::test]
    async fn test_clear_cache_idempotent() {
        let worker = idle_worker().await;
        for _ in 0..2 {
            let result = message_impl(&worker, SwMessageParams { message: json!({"type": "CLEAR_CACHE"}) }).await;
            assert!(result.is_ok());
            assert!(!worker.db().has_store("teampulse-v1").await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_unknown_message() {
        let worker = idle_worker().await;
        let err = message_impl(&worker, SwMessageParams { message: json!({"type": "NOPE"}) })
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
