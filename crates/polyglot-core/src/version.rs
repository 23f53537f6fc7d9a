//! Immutable translation snapshots and their object-storage layout.
//!
//! A version is never stored as a record of its own. Its identity lives in
//! the object-storage prefix `{project}/{uuid}_{name}_{unix seconds}/`, under
//! which every snapshotted file is written as `{format}/{language}.{ext}`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ContentMeta, PolyglotError, PolyglotResult, LATEST};

/// Longest accepted version name.
pub const MAX_VERSION_NAME_LEN: usize = 20;

/// A named snapshot of every language of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Version {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Creates a new version stamped with the current second.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now),
        }
    }

    /// Object-storage prefix of this version, including the trailing `/`.
    #[must_use]
    pub fn prefix(&self, project_id: u64) -> String {
        format!(
            "{}/{}_{}_{}/",
            project_id,
            self.id,
            self.name,
            self.created_at.timestamp()
        )
    }

    /// Key of one snapshotted file.
    #[must_use]
    pub fn object_key(&self, project_id: u64, format: &ContentMeta, language: &str) -> String {
        object_key(&self.prefix(project_id), format, language)
    }

    /// Decodes a prefix produced by [`Version::prefix`].
    ///
    /// The id ends at the first `_` and the timestamp starts after the last
    /// one, so names may themselves contain underscores.
    ///
    /// # Errors
    ///
    /// Returns `PolyglotError::Validation` when the prefix is malformed.
    pub fn from_prefix(prefix: &str) -> PolyglotResult<Self> {
        let invalid = || PolyglotError::Validation(format!("Malformed version prefix '{}'", prefix));

        let segment = prefix
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .ok_or_else(invalid)?;

        let (id, rest) = segment.split_once('_').ok_or_else(invalid)?;
        let (name, timestamp) = rest.rsplit_once('_').ok_or_else(invalid)?;

        let id = Uuid::parse_str(id).map_err(|_| invalid())?;
        let timestamp: i64 = timestamp.parse().map_err(|_| invalid())?;
        let created_at = Utc.timestamp_opt(timestamp, 0).single().ok_or_else(invalid)?;

        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            id,
            name: name.to_string(),
            created_at,
        })
    }
}

/// Key of one snapshotted file under a version prefix.
#[must_use]
pub fn object_key(prefix: &str, format: &ContentMeta, language: &str) -> String {
    format!("{}{}/{}.{}", prefix, format.format, language, format.extension)
}

/// Listing prefix that holds every version of a project.
#[must_use]
pub fn project_prefix(project_id: u64) -> String {
    format!("{}/", project_id)
}

/// Checks a user-supplied version name.
///
/// # Errors
///
/// Returns `PolyglotError::Validation` when the name is empty, too long,
/// reserved, or contains characters outside `[A-Za-z0-9._-]`.
pub fn validate_version_name(name: &str) -> PolyglotResult<()> {
    if name.is_empty() || name.len() > MAX_VERSION_NAME_LEN {
        return Err(PolyglotError::Validation(format!(
            "Version name must be between 1 and {} characters",
            MAX_VERSION_NAME_LEN
        )));
    }
    if name.eq_ignore_ascii_case(LATEST) {
        return Err(PolyglotError::Validation(format!(
            "Version name '{}' is reserved",
            name
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(PolyglotError::Validation(format!(
            "Version name '{}' may only contain letters, digits, '.', '_' and '-'",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_round_trip_with_underscores() {
        let version = Version::new("release_2024_q1");
        let prefix = version.prefix(12);
        assert!(prefix.starts_with("12/"));
        assert!(prefix.ends_with('/'));

        let decoded = Version::from_prefix(&prefix).unwrap();
        assert_eq!(decoded, version);
    }

    #[test]
    fn test_from_prefix_known_value() {
        let decoded =
            Version::from_prefix("7/67e55044-10b1-426f-9247-bb680e5fe0c8_v2_1700000000/").unwrap();
        assert_eq!(decoded.name, "v2");
        assert_eq!(decoded.created_at.timestamp(), 1_700_000_000);
        assert_eq!(
            decoded.id.to_string(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }

    #[test]
    fn test_from_prefix_rejects_garbage() {
        assert!(Version::from_prefix("7/not-a-version/").is_err());
        assert!(Version::from_prefix("7/67e55044-10b1-426f-9247-bb680e5fe0c8_v2_abc/").is_err());
        assert!(Version::from_prefix("7/nope_v2_1700000000/").is_err());
        assert!(Version::from_prefix("").is_err());
    }

    #[test]
    fn test_object_key() {
        let meta = ContentMeta::lookup("android_strings").unwrap();
        assert_eq!(
            object_key("7/abc_v2_1/", meta, "en"),
            "7/abc_v2_1/android_strings/en.xml"
        );
        assert_eq!(project_prefix(7), "7/");
    }

    #[test]
    fn test_validate_version_name() {
        assert!(validate_version_name("v1.0-rc_1").is_ok());
        assert!(validate_version_name("").is_err());
        assert!(validate_version_name("latest").is_err());
        assert!(validate_version_name("a/b").is_err());
        assert!(validate_version_name(&"x".repeat(21)).is_err());
        assert!(validate_version_name(&"x".repeat(20)).is_ok());
    }
}
