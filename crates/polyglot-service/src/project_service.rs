//! Project service trait definition.

use crate::dto::{LanguageResponse, ProjectDetailsResponse, ProjectResponse};
use async_trait::async_trait;
use polyglot_core::{Interface, PolyglotResult};

/// Read-only view of the upstream project catalog.
#[async_trait]
pub trait ProjectService: Interface + Send + Sync {
    /// Lists every project with its number of stored versions.
    async fn list_projects(&self) -> PolyglotResult<Vec<ProjectResponse>>;

    /// Gets one project.
    async fn get_project(&self, project_id: u64) -> PolyglotResult<ProjectDetailsResponse>;

    /// Lists the languages of a project.
    async fn list_languages(&self, project_id: u64) -> PolyglotResult<Vec<LanguageResponse>>;
}
