//! Collaborator contracts the worker consumes.

use async_trait::async_trait;

use crate::Error;
use crate::fetch::{Request, Response};

/// The fetch boundary.
///
/// Implementations return `Ok` for any HTTP response regardless of status.
/// `Err` is reserved for transport failures (connection refused, DNS,
/// timeout, oversized body), which strategies treat as "offline".
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Drains queued offline mutations when a background sync fires.
///
/// Errors must be returned, not swallowed: the platform reschedules the
/// sync when the handler fails.
#[async_trait]
pub trait SyncDelegate: Send + Sync {
    async fn sync(&self, tag: &str) -> Result<(), Error>;
}
