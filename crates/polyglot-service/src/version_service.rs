//! Version service trait definition.

use crate::dto::{CreateVersionRequest, VersionResponse};
use async_trait::async_trait;
use polyglot_core::{Interface, PolyglotResult};

/// Immutable project snapshots kept in object storage.
#[async_trait]
pub trait VersionService: Interface + Send + Sync {
    /// Snapshots every language of a project under a new version.
    async fn create_version(
        &self,
        project_id: u64,
        request: CreateVersionRequest,
    ) -> PolyglotResult<VersionResponse>;

    /// Lists the versions of a project, newest first.
    async fn list_versions(&self, project_id: u64) -> PolyglotResult<Vec<VersionResponse>>;

    /// Deletes a version and every cached copy of the project.
    async fn delete_version(&self, project_id: u64, version_id: &str) -> PolyglotResult<()>;

    /// Checks the object store is reachable.
    async fn check_storage(&self) -> PolyglotResult<()>;
}
