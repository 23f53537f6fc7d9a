//! # Polyglot REST
//!
//! HTTP surfaces of Polyglot using Axum. The public router serves translation
//! files; the private router carries health, metrics, the project catalog,
//! version management and cache purges.

pub mod controllers;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
