//! # Polyglot Core
//!
//! Core types, checksums, and error definitions for Polyglot, a pull-through
//! cache in front of a translation-management API.
//! Every other crate in the workspace builds on the types defined here.

pub mod error;
pub mod format;
pub mod result;
pub mod telemetry;
pub mod translation;
pub mod version;

pub use error::*;
pub use format::*;
pub use result::*;
pub use translation::*;
pub use version::*;

// Re-export shaku so trait objects share the same `Interface` bound
pub use shaku::Interface;
