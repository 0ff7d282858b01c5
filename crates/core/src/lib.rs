//! Core types and shared functionality for the TeamPulse offline worker.
//!
//! This crate provides:
//! - Request/response types for the fetch boundary
//! - Collaborator traits (`Network`, `SyncDelegate`)
//! - Versioned response stores with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod net;
pub mod strategy;

pub use cache::{CacheDb, CacheEntry, StoreStats};
pub use config::{AppConfig, ConfigError, RouteOverride};
pub use error::Error;
pub use fetch::{Credentials, Request, RequestMode, Response};
pub use net::{Network, SyncDelegate};
pub use strategy::Strategy;
