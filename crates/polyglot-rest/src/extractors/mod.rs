//! Custom Axum extractors and path parsing helpers.

mod path;
mod validated;

pub use path::*;
pub use validated::*;
