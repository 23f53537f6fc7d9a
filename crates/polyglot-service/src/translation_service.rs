//! Translation service trait definition.

use async_trait::async_trait;
use polyglot_core::{CacheKey, Interface, PolyglotResult, Translation, VersionLabel};

/// One translation lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub project_id: u64,
    pub language: String,
    pub format: String,
    pub version: VersionLabel,
    pub tags: Vec<String>,
}

impl TranslationRequest {
    /// Request for the latest data without tags.
    #[must_use]
    pub fn latest(project_id: u64, language: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            project_id,
            language: language.into(),
            format: format.into(),
            version: VersionLabel::Latest,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.project_id, self.language.as_str(), self.format.as_str())
            .with_version(self.version.clone())
            .with_tags(self.tags.iter().cloned())
    }
}

/// Pull-through translation lookups and cache maintenance.
#[async_trait]
pub trait TranslationService: Interface + Send + Sync {
    /// Serves a translation from the cache, fetching it on a miss.
    async fn get_translation(&self, request: TranslationRequest) -> PolyglotResult<Translation>;

    /// Drops every cached entry of one project language.
    async fn purge_translation(&self, project_id: u64, language: &str) -> PolyglotResult<()>;

    /// Drops every cached entry of a project.
    async fn purge_project(&self, project_id: u64) -> PolyglotResult<()>;

    /// Checks the cache store is reachable.
    async fn check_cache(&self) -> PolyglotResult<()>;
}
