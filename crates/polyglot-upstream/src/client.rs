//! Upstream client contract and its request/response types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polyglot_core::{Interface, PolyglotResult};
use serde::{Deserialize, Serialize};

/// Filter that restricts an export to translated terms.
pub const FILTER_TRANSLATED: &str = "translated";

/// Parameters of a single-language export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub project_id: u64,
    pub language: String,
    pub format: String,
    pub filters: Vec<String>,
    pub tags: Vec<String>,
}

impl ExportRequest {
    /// Export of translated terms only, the way every cache fill requests it.
    #[must_use]
    pub fn translated(project_id: u64, language: &str, format: &str, tags: &[String]) -> Self {
        Self {
            project_id,
            language: language.to_string(),
            format: format.to_string(),
            filters: vec![FILTER_TRANSLATED.to_string()],
            tags: tags.to_vec(),
        }
    }
}

/// A language configured on an upstream project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLanguage {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub translations: i64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub updated: Option<String>,
}

/// One entry of the upstream project list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub created: Option<String>,
}

/// Details of one upstream project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_language: Option<String>,
    #[serde(default)]
    pub terms: i64,
    #[serde(default)]
    pub created: Option<String>,
}

/// Client of the upstream translation provider.
#[async_trait]
pub trait TranslationClient: Interface + Send + Sync {
    /// Requests an export and returns the short-lived download URL.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` when the token cannot access the project,
    /// `LanguageNotFound` when the project lacks the language, and
    /// `ExternalService` for every other failure.
    async fn export_project(&self, request: ExportRequest) -> PolyglotResult<String>;

    /// Downloads an exported file.
    async fn download(&self, url: &str) -> PolyglotResult<Vec<u8>>;

    /// Lists the languages of a project.
    async fn list_project_languages(&self, project_id: u64) -> PolyglotResult<Vec<ProjectLanguage>>;

    /// Lists every project visible to the API token.
    async fn list_projects(&self) -> PolyglotResult<Vec<ProjectSummary>>;

    /// Returns details of one project.
    async fn view_project(&self, project_id: u64) -> PolyglotResult<ProjectDetails>;
}

/// Parses upstream timestamps, which come either as RFC 3339 or with a
/// colon-less offset (`2013-06-10T11:08:54+0000`).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
