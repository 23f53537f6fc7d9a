//! Unified error types for all layers of the application.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all layers of Polyglot.
///
/// Variants carry enough structure for the HTTP layer to tell upstream
/// permission problems and missing languages or versions apart from generic
/// failures.
#[derive(Error, Debug)]
pub enum PolyglotError {
    // ============ Cache Errors ============
    /// The requested cache entry does not exist or has expired.
    ///
    /// This is an expected outcome, never a failure worth logging.
    #[error("Cache miss")]
    CacheMiss,

    /// Cache infrastructure failure (disk I/O, connectivity).
    #[error("Cache error: {0}")]
    Cache(String),

    // ============ Upstream Errors ============
    /// The upstream provider refused access to the project.
    #[error("You don't have permission to access project {project_id}")]
    PermissionDenied { project_id: u64 },

    /// The upstream project has no such language.
    #[error("Project {project_id} does not contain specified language {language_code}")]
    LanguageNotFound {
        project_id: u64,
        language_code: String,
    },

    /// External service error
    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    // ============ Version Errors ============
    /// A pinned version (or its language file) is absent from object storage.
    #[error("Project {project_id} does not contain specified language {language_code} with version {version} in storage")]
    NotFoundInStorage {
        project_id: u64,
        language_code: String,
        version: String,
    },

    /// No stored version has the given identifier.
    #[error("Project {project_id} has no version {version_id}")]
    VersionNotFound { project_id: u64, version_id: String },

    /// A version with the same name already exists.
    #[error("Project {project_id} already has a version named {name}")]
    VersionAlreadyExists { project_id: u64, name: String },

    /// One or more snapshot jobs failed; the partial snapshot was discarded.
    #[error("Snapshot failed: {failed} of {total} jobs failed, first error: {source}")]
    SnapshotFailed {
        failed: usize,
        total: usize,
        source: Box<PolyglotError>,
    },

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    // ============ Request Errors ============
    /// Resource not found
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller went away before the work completed.
    #[error("Request cancelled")]
    Cancelled,

    // ============ Internal Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PolyglotError {
    /// Returns the HTTP status code for this error.
    ///
    /// `Cancelled` maps to the non-standard 499 (client closed request).
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::PermissionDenied { .. }
            | Self::VersionAlreadyExists { .. }
            | Self::Validation(_) => 400,
            Self::CacheMiss
            | Self::LanguageNotFound { .. }
            | Self::NotFoundInStorage { .. }
            | Self::VersionNotFound { .. }
            | Self::NotFound { .. } => 404,
            Self::Cancelled => 499,
            Self::SnapshotFailed { source, .. } => source.status_code(),
            Self::Cache(_)
            | Self::ExternalService { .. }
            | Self::Storage(_)
            | Self::Configuration(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CacheMiss => "CACHE_MISS",
            Self::Cache(_) => "CACHE_ERROR",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::LanguageNotFound { .. } => "LANGUAGE_NOT_FOUND",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::NotFoundInStorage { .. } => "NOT_FOUND_IN_STORAGE",
            Self::VersionNotFound { .. } => "VERSION_NOT_FOUND",
            Self::VersionAlreadyExists { .. } => "VERSION_ALREADY_EXISTS",
            Self::SnapshotFailed { .. } => "SNAPSHOT_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Cancelled => "CLIENT_CLOSED_REQUEST",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns `true` for the cache-miss sentinel.
    #[must_use]
    pub const fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss)
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a cache infrastructure error.
    #[must_use]
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache(message.into())
    }

    /// Creates a storage error.
    #[must_use]
    pub fn storage<T: Into<String>>(message: T) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an external service error.
    #[must_use]
    pub fn external<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for PolyglotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Request trace ID for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new error response from a `PolyglotError`.
    #[must_use]
    pub fn from_error(error: &PolyglotError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            trace_id: None,
        }
    }

    /// Sets the trace ID.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<&PolyglotError> for ErrorResponse {
    fn from(error: &PolyglotError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(PolyglotError::PermissionDenied { project_id: 1 }.status_code(), 400);
        assert_eq!(
            PolyglotError::LanguageNotFound {
                project_id: 1,
                language_code: "en".to_string()
            }
            .status_code(),
            404
        );
        assert_eq!(
            PolyglotError::NotFoundInStorage {
                project_id: 7,
                language_code: "en".to_string(),
                version: "v2".to_string()
            }
            .status_code(),
            404
        );
        assert_eq!(PolyglotError::Cancelled.status_code(), 499);
        assert_eq!(PolyglotError::cache("disk full").status_code(), 500);
        assert_eq!(PolyglotError::external("poeditor", "boom").status_code(), 500);
        assert_eq!(PolyglotError::validation("bad format").status_code(), 400);
    }

    #[test]
    fn test_snapshot_failure_takes_status_of_cause() {
        let err = PolyglotError::SnapshotFailed {
            failed: 1,
            total: 4,
            source: Box::new(PolyglotError::PermissionDenied { project_id: 3 }),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "SNAPSHOT_FAILED");
        assert!(err.to_string().contains("1 of 4"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(PolyglotError::CacheMiss.error_code(), "CACHE_MISS");
        assert_eq!(PolyglotError::Cancelled.error_code(), "CLIENT_CLOSED_REQUEST");
        assert_eq!(PolyglotError::storage("x").error_code(), "STORAGE_ERROR");
        assert_eq!(PolyglotError::internal("x").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_cache_miss_sentinel() {
        assert!(PolyglotError::CacheMiss.is_cache_miss());
        assert!(!PolyglotError::cache("io").is_cache_miss());
    }

    #[test]
    fn test_messages_carry_identifiers() {
        let err = PolyglotError::NotFoundInStorage {
            project_id: 7,
            language_code: "en".to_string(),
            version: "v2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Project 7 does not contain specified language en with version v2 in storage"
        );

        let err = PolyglotError::PermissionDenied { project_id: 12 };
        assert_eq!(err.to_string(), "You don't have permission to access project 12");
    }

    #[test]
    fn test_error_response_from_error() {
        let err = PolyglotError::not_found("object", "7/abc");
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "NOT_FOUND");
        assert!(response.message.contains("7/abc"));
        assert!(response.trace_id.is_none());

        let response = ErrorResponse::from(&err).with_trace_id("req-1");
        assert_eq!(response.trace_id.as_deref(), Some("req-1"));
    }
}
