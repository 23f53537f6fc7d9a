//! Project catalog backed by the upstream API and the version store.

use crate::dto::{LanguageResponse, ProjectDetailsResponse, ProjectResponse};
use crate::project_service::ProjectService;
use async_trait::async_trait;
use polyglot_core::{project_prefix, PolyglotResult, Version};
use polyglot_storage::ObjectStorage;
use polyglot_upstream::TranslationClient;
use std::sync::Arc;
use tracing::debug;

/// Project service implementation.
pub struct ProjectServiceImpl {
    client: Arc<dyn TranslationClient>,
    storage: Arc<dyn ObjectStorage>,
}

impl ProjectServiceImpl {
    /// Creates a new project service.
    pub fn new(client: Arc<dyn TranslationClient>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { client, storage }
    }

    async fn version_count(&self, project_id: u64) -> PolyglotResult<usize> {
        let listing = self.storage.list_objects(&project_prefix(project_id)).await?;
        Ok(listing
            .common_prefixes
            .iter()
            .filter(|prefix| Version::from_prefix(prefix).is_ok())
            .count())
    }
}

#[async_trait]
impl ProjectService for ProjectServiceImpl {
    async fn list_projects(&self) -> PolyglotResult<Vec<ProjectResponse>> {
        let projects = self.client.list_projects().await?;
        debug!(count = projects.len(), "Listed upstream projects");

        let mut responses = Vec::with_capacity(projects.len());
        for project in projects {
            let count = self.version_count(project.id).await?;
            responses.push(ProjectResponse::from_summary(project, count));
        }
        Ok(responses)
    }

    async fn get_project(&self, project_id: u64) -> PolyglotResult<ProjectDetailsResponse> {
        let details = self.client.view_project(project_id).await?;
        let count = self.version_count(project_id).await?;
        Ok(ProjectDetailsResponse::from_details(details, count))
    }

    async fn list_languages(&self, project_id: u64) -> PolyglotResult<Vec<LanguageResponse>> {
        let languages = self.client.list_project_languages(project_id).await?;
        Ok(languages.into_iter().map(LanguageResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeClient;
    use polyglot_core::{ContentMeta, PolyglotError};
    use polyglot_storage::LocalObjectStorage;
    use std::collections::HashMap;
    use tempfile::TempDir;

    async fn service(client: FakeClient) -> (TempDir, Arc<LocalObjectStorage>, ProjectServiceImpl) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(LocalObjectStorage::new(dir.path()).await.unwrap());
        let service = ProjectServiceImpl::new(Arc::new(client), storage.clone());
        (dir, storage, service)
    }

    #[tokio::test]
    async fn test_list_projects_counts_versions() {
        let (_dir, storage, service) = service(FakeClient::new(b"").with_projects(&[1, 2])).await;
        let meta = ContentMeta::for_format("json").unwrap();
        for name in ["v1", "v2"] {
            storage
                .put_object(
                    &Version::new(name).object_key(2, meta, "en"),
                    b"{}".to_vec(),
                    HashMap::new(),
                    meta.mime_type,
                )
                .await
                .unwrap();
        }

        let projects = service.list_projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].version_count, 0);
        assert_eq!(projects[1].version_count, 2);
        assert!(projects[1].created.is_some());
    }

    #[tokio::test]
    async fn test_get_project_and_languages() {
        let (_dir, _storage, service) =
            service(FakeClient::new(b"").with_projects(&[5]).with_languages(&["en", "da"])).await;

        let project = service.get_project(5).await.unwrap();
        assert_eq!(project.terms, 42);
        assert_eq!(project.version_count, 0);

        let err = service.get_project(6).await.unwrap_err();
        assert!(matches!(err, PolyglotError::PermissionDenied { project_id: 6 }));

        let languages = service.list_languages(5).await.unwrap();
        let codes: Vec<&str> = languages.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["en", "da"]);
    }
}
