//! sw_install and sw_activate tool implementations.
//!
//! The bridge stands in for the platform here: once install (or a
//! `SKIP_WAITING` message) leaves the worker installed with skip-waiting
//! set, it activates straight away.

use pulse_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{effect_names, json_result};
use crate::controller::Worker;
use crate::events::Event;
use crate::state::Phase;

/// Output from the lifecycle tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleOutput {
    pub version: String,
    pub store: String,
    pub phase: Phase,
    pub skip_waiting: bool,
    pub clients_claimed: bool,
    /// Whether this call ended with an activation.
    pub activated: bool,
    /// Effects requested by the worker, in order.
    pub effects: Vec<String>,
}

/// Activate if the worker is installed and asked to skip waiting.
///
/// Returns the activation effects, or `None` if the worker should keep waiting.
pub(crate) async fn activate_if_ready(worker: &Worker) -> Result<Option<Vec<String>>, Error> {
    if !worker.state().await.ready_to_activate() {
        return Ok(None);
    }
    let effects = worker.dispatch(Event::Activate).await?;
    Ok(Some(effect_names(&effects)))
}

async fn output(worker: &Worker, activated: bool, effects: Vec<String>) -> LifecycleOutput {
    let state = worker.state().await;
    LifecycleOutput {
        version: state.version,
        store: state.store,
        phase: state.phase,
        skip_waiting: state.skip_waiting,
        clients_claimed: state.clients_claimed,
        activated,
        effects,
    }
}

pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let mut effects = effect_names(&worker.dispatch(Event::Install).await?);

    let activated = match activate_if_ready(worker).await? {
        Some(more) => {
            effects.extend(more);
            true
        }
        None => false,
    };

    json_result(&output(worker, activated, effects).await)
}

pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let effects = effect_names(&worker.dispatch(Event::Activate).await?);
    json_result(&output(worker, true, effects).await)
}
