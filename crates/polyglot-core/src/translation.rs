//! Cache keys, cached items, and the checksum that ties them together.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Reserved label for the most recent upstream data.
pub const LATEST: &str = "latest";

/// Computes the hex-encoded MD5 checksum of a payload.
#[must_use]
pub fn checksum(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Which data a key refers to: live upstream data or a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum VersionLabel {
    #[default]
    Latest,
    Pinned(String),
}

impl VersionLabel {
    /// Interprets an optional request parameter. Empty and `latest` mean live data.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Latest,
            Some(v) if v.eq_ignore_ascii_case(LATEST) => Self::Latest,
            Some(v) => Self::Pinned(v.to_string()),
        }
    }

    #[must_use]
    pub const fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Latest => LATEST,
            Self::Pinned(name) => name,
        }
    }
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one cached translation file.
///
/// Tags are sorted and de-duplicated on construction, so two keys built from
/// the same tuple always derive the same storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub project_id: u64,
    pub language: String,
    pub format: String,
    pub version: VersionLabel,
    tags: Vec<String>,
}

impl CacheKey {
    /// Creates a key for the latest data without tags.
    #[must_use]
    pub fn new(project_id: u64, language: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            project_id,
            language: language.into(),
            format: format.into(),
            version: VersionLabel::Latest,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: VersionLabel) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags
            .into_iter()
            .map(Into::into)
            .filter(|t| !t.is_empty())
            .collect();
        tags.sort();
        tags.dedup();
        self.tags = tags;
        self
    }

    /// Sorted, de-duplicated tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Key used by the Redis backend: `{project}:{language}:{format}[:{version}][:[{t1,t2}]]`.
    #[must_use]
    pub fn redis_key(&self) -> String {
        let mut key = format!("{}:{}:{}", self.project_id, self.language, self.format);
        if let VersionLabel::Pinned(name) = &self.version {
            key.push(':');
            key.push_str(name);
        }
        if !self.tags.is_empty() {
            key.push_str(&format!(":[{}]", self.tags.join(",")));
        }
        key
    }

    /// Blob file name used by the filesystem backend:
    /// `{project}_{language}_{format}[@{len}.{version}][_{len}.{tag}]*`.
    ///
    /// Version and tags are length-prefixed because both may contain `_`
    /// and `.`; `a_b` and `a`,`b` must not share a file.
    #[must_use]
    pub fn file_name(&self) -> String {
        let mut name = format!("{}_{}_{}", self.project_id, self.language, self.format);
        if let VersionLabel::Pinned(version) = &self.version {
            name.push_str(&format!("@{}.{}", version.len(), version));
        }
        for tag in &self.tags {
            name.push_str(&format!("_{}.{}", tag.len(), tag));
        }
        name
    }

    /// Iterates over every free-form component of the key.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        [self.language.as_str(), self.format.as_str(), self.version.as_str()]
            .into_iter()
            .chain(self.tags.iter().map(String::as_str))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redis_key())
    }
}

/// A stored translation payload as returned by a cache backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheItem {
    /// Set by the store at write time.
    pub created_at: DateTime<Utc>,
    /// Hex MD5 of `data`.
    pub checksum: String,
    pub data: Vec<u8>,
}

impl CacheItem {
    /// Builds an item stamped with the current time.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            created_at: Utc::now(),
            checksum: checksum(&data),
            data,
        }
    }

    /// Returns `true` when `checksum` matches `data`.
    #[must_use]
    pub fn is_intact(&self) -> bool {
        checksum(&self.data) == self.checksum
    }

    /// Moment the item stops being served.
    #[must_use]
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns `true` when fewer than `threshold` remain before expiry.
    #[must_use]
    pub fn is_due_for_renewal(&self, ttl: Duration, threshold: Duration, now: DateTime<Utc>) -> bool {
        let remaining = self.expires_at(ttl).signed_duration_since(now);
        chrono::Duration::from_std(threshold).map_or(true, |threshold| remaining < threshold)
    }
}

/// Translation payload returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub data: Vec<u8>,
    pub checksum: String,
    /// TTL of the store that served it.
    pub ttl: Duration,
}

impl Translation {
    #[must_use]
    pub fn from_item(item: CacheItem, ttl: Duration) -> Self {
        Self {
            data: item.data,
            checksum: item.checksum,
            ttl,
        }
    }
}
