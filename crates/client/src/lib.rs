//! Network-side collaborators for the TeamPulse offline worker.
//!
//! This crate provides the reqwest-backed fetch boundary and the HTTP
//! background-sync delegate used by the worker binary.

pub mod fetch;
pub mod sync;

pub use fetch::{FetchClient, FetchConfig, UrlError, resolve, same_origin};
pub use sync::HttpSync;
