//! # Polyglot Server Library
//!
//! Wires configuration, cache, upstream client, object storage and services
//! into the public and private routers, and runs both listeners.

pub mod app;
pub mod startup;

pub use app::{build_cache, install_metrics, Application};
