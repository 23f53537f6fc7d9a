//! # Polyglot Storage
//!
//! Object storage used to keep immutable translation snapshots.
//!
//! ```text
//! VersionService / TranslationService
//!   ↓  Arc<dyn ObjectStorage>   (storage interface)
//! LocalObjectStorage            (directory-backed implementation)
//! ```

pub mod local;
pub mod traits;

pub use local::LocalObjectStorage;
pub use traits::*;
