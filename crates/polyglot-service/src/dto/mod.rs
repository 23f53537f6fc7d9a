//! Data Transfer Objects (DTOs).

mod project_dto;
mod version_dto;

pub use project_dto::*;
pub use version_dto::*;
