//! # Polyglot Service
//!
//! Cache backends and the services behind the HTTP surfaces: pull-through
//! translation lookups, version snapshots and the project catalog.

pub mod cache;
pub mod dto;
pub mod r#impl;
pub mod metrics;
pub mod project_service;
pub mod translation_service;
pub mod version_service;

#[cfg(test)]
mod test_support;

pub use cache::*;
pub use dto::*;
pub use project_service::*;
pub use r#impl::*;
pub use translation_service::*;
pub use version_service::*;
