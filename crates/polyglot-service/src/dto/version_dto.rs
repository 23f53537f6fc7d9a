//! Version-related DTOs.

use chrono::{DateTime, Utc};
use polyglot_core::Version;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request to snapshot every language of a project.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateVersionRequest {
    #[validate(length(min = 1, max = 20, message = "Version name must be 1-20 characters"))]
    pub name: String,

    /// Export formats to snapshot. Defaults to the configured list.
    #[serde(default)]
    #[validate(length(max = 32))]
    pub formats: Option<Vec<String>>,
}

/// Version response DTO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VersionResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Version> for VersionResponse {
    fn from(version: Version) -> Self {
        Self {
            id: version.id,
            name: version.name,
            created_at: version.created_at,
        }
    }
}
