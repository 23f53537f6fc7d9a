//! Project catalog DTOs.

use chrono::{DateTime, Utc};
use polyglot_upstream::{parse_timestamp, ProjectDetails, ProjectLanguage, ProjectSummary};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Project list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: u64,
    pub name: String,
    pub created: Option<DateTime<Utc>>,
    /// Number of stored versions.
    pub version_count: usize,
}

impl ProjectResponse {
    #[must_use]
    pub fn from_summary(summary: ProjectSummary, version_count: usize) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            created: summary.created.as_deref().and_then(parse_timestamp),
            version_count,
        }
    }
}

/// Project details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProjectDetailsResponse {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub reference_language: Option<String>,
    pub terms: i64,
    pub created: Option<DateTime<Utc>>,
    pub version_count: usize,
}

impl ProjectDetailsResponse {
    #[must_use]
    pub fn from_details(details: ProjectDetails, version_count: usize) -> Self {
        Self {
            id: details.id,
            name: details.name,
            description: details.description.filter(|d| !d.is_empty()),
            reference_language: details.reference_language.filter(|l| !l.is_empty()),
            terms: details.terms,
            created: details.created.as_deref().and_then(parse_timestamp),
            version_count,
        }
    }
}

/// Language of a project with its translation progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LanguageResponse {
    pub name: String,
    pub code: String,
    pub translations: i64,
    pub percentage: f64,
    pub updated: Option<DateTime<Utc>>,
}

impl From<ProjectLanguage> for LanguageResponse {
    fn from(language: ProjectLanguage) -> Self {
        Self {
            updated: language.updated.as_deref().and_then(parse_timestamp),
            name: language.name,
            code: language.code,
            translations: language.translations,
            percentage: language.percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_response_parses_created() {
        let response = ProjectResponse::from_summary(
            ProjectSummary {
                id: 7717,
                name: "Mobile".into(),
                created: Some("2013-06-10T11:08:54+0000".into()),
            },
            3,
        );
        assert_eq!(response.version_count, 3);
        assert_eq!(response.created.unwrap().timestamp(), 1_370_862_534);
    }

    #[test]
    fn test_details_drop_empty_strings() {
        let response = ProjectDetailsResponse::from_details(
            ProjectDetails {
                id: 1,
                name: "Web".into(),
                description: Some(String::new()),
                reference_language: Some("en".into()),
                terms: 10,
                created: None,
            },
            0,
        );
        assert!(response.description.is_none());
        assert_eq!(response.reference_language.as_deref(), Some("en"));
    }
}
