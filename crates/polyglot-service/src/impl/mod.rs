//! Service implementations.
//!
//! Trait definitions live in the parent module (e.g. `translation_service.rs`).

pub mod project_service_impl;
pub mod translation_service_impl;
pub mod version_service_impl;

pub use project_service_impl::ProjectServiceImpl;
pub use translation_service_impl::TranslationServiceImpl;
pub use version_service_impl::VersionServiceImpl;
