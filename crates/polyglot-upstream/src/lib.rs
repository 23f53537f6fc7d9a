//! # Polyglot Upstream
//!
//! Client for the translation-management API that Polyglot caches.
//! [`TranslationClient`] is the seam the service layer depends on;
//! [`PoEditorClient`] talks to the POEditor v2 API over HTTP.

mod client;
mod poeditor;

pub use client::*;
pub use poeditor::*;
