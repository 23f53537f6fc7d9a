//! REST API controllers.

pub mod cache_controller;
pub mod health_controller;
pub mod metrics_controller;
pub mod project_controller;
pub mod translation_controller;
pub mod version_controller;

pub use health_controller::*;
