//! TeamPulse offline worker.
//!
//! A cache controller that intercepts page fetches and serves them from a
//! versioned SQLite store or the network according to a per-request
//! strategy. It also handles the worker's background events (push,
//! notification clicks, background sync and page messages). The binary
//! exposes it over MCP on stdio.

pub mod classify;
pub mod controller;
pub mod events;
pub mod handler;
pub mod lifecycle;
pub mod message;
pub mod offline;
pub mod push;
pub mod refresh;
pub mod state;
pub mod strategy;
pub mod tools;

#[cfg(test)]
mod testing;

pub use classify::Classifier;
pub use controller::Worker;
pub use events::{Effect, Event};
pub use handler::PulseServer;
pub use message::Message;
pub use offline::{is_offline_response, offline_response};
pub use push::Notification;
pub use state::{Phase, WorkerState};
