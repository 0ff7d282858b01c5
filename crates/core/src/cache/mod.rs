//! SQLite-backed response stores.
//!
//! This module provides persistent, versioned stores of response snapshots
//! keyed by request identity, using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Named stores, one current per deployed version
//! - SHA-256 request identity keys (method + URL)
//! - Atomic multi-entry commits for precaching
//! - Cascading deletes when a store is evicted
//! - Automatic schema migrations and WAL mode

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use stores::StoreStats;
