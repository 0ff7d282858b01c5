//! Worker lifecycle phases and the transitions between them.
//!
//! ```text
//! parsed ──install──▶ installing ──ok──▶ installed ──activate──▶ activating ──ok──▶ active
//!    ▲                    │                  ▲                        │
//!    │                    └──err──▶ failed   └─────────err────────────┘
//!    └── (retry allowed from failed)
//! ```

use std::fmt;

use pulse_core::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    Active,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Parsed => "parsed",
            Phase::Installing => "installing",
            Phase::Installed => "installed",
            Phase::Activating => "activating",
            Phase::Active => "active",
            Phase::Failed => "failed",
        }
    }

    /// Only an active worker controls clients and sees their fetches.
    pub fn intercepts_fetch(&self) -> bool {
        *self == Phase::Active
    }

    /// Apply a transition, rejecting moves that are illegal from this phase.
    pub fn apply(self, transition: Transition) -> Result<Phase, Error> {
        use Phase::*;
        use Transition::*;

        match (self, transition) {
            (Parsed | Failed, BeginInstall) => Ok(Installing),
            (Installing, InstallSucceeded) => Ok(Installed),
            (Installing, InstallFailed) => Ok(Failed),
            (Installed, BeginActivate) => Ok(Activating),
            (Activating, ActivateSucceeded) => Ok(Active),
            (Activating, ActivateFailed) => Ok(Installed),
            (phase, transition) => {
                Err(Error::InvalidState { expected: transition.expected().to_string(), actual: phase.to_string() })
            }
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BeginInstall,
    InstallSucceeded,
    InstallFailed,
    BeginActivate,
    ActivateSucceeded,
    ActivateFailed,
}

impl Transition {
    fn expected(&self) -> &'static str {
        match self {
            Transition::BeginInstall => "parsed or failed",
            Transition::InstallSucceeded | Transition::InstallFailed => "installing",
            Transition::BeginActivate => "installed",
            Transition::ActivateSucceeded | Transition::ActivateFailed => "activating",
        }
    }
}

/// Everything the controller knows about its own lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerState {
    pub version: String,
    pub store: String,
    pub phase: Phase,
    /// Set once install succeeds or a page asks for it; the host activates
    /// without waiting for old clients to close.
    pub skip_waiting: bool,
    pub clients_claimed: bool,
    pub installed_at: Option<String>,
    pub activated_at: Option<String>,
}

impl WorkerState {
    pub fn new(version: &str, store: &str) -> Self {
        Self {
            version: version.to_string(),
            store: store.to_string(),
            phase: Phase::default(),
            skip_waiting: false,
            clients_claimed: false,
            installed_at: None,
            activated_at: None,
        }
    }

    pub fn transition(&mut self, transition: Transition) -> Result<Phase, Error> {
        let next = self.phase.apply(transition)?;
        tracing::debug!(from = %self.phase, to = %next, ?transition, "phase transition");
        self.phase = next;
        Ok(next)
    }

    /// Whether the host should activate now rather than wait.
    pub fn ready_to_activate(&self) -> bool {
        self.phase == Phase::Installed && self.skip_waiting
    }
}
