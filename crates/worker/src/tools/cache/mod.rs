//! Cache inspection tools.
//!
//! Read-only views of the SQLite store the worker serves from.

pub mod get;
pub mod stores;

pub use get::{CacheGetParams, get_impl};
pub use stores::{CacheStoresParams, stores_impl};
