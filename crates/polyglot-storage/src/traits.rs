//! Object storage contract.

use async_trait::async_trait;
use polyglot_core::{Interface, PolyglotError, PolyglotResult};
use std::collections::HashMap;

/// Delimiter that separates "directories" in object keys.
pub const DELIMITER: char = '/';

/// Largest number of keys removed per delete batch.
pub const DELETE_BATCH_SIZE: usize = 1000;

/// Result of a delimited listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// Distinct `{prefix}{segment}/` groups below the listed prefix, sorted.
    pub common_prefixes: Vec<String>,
    /// Keys directly below the listed prefix, sorted.
    pub contents: Vec<String>,
}

/// Flat key/value blob store with S3-style prefix listing.
#[async_trait]
pub trait ObjectStorage: Interface + Send + Sync {
    /// Stores an object, replacing any previous one under the key.
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        metadata: HashMap<String, String>,
        content_type: &str,
    ) -> PolyglotResult<()>;

    /// Reads an object. A missing key is `PolyglotError::NotFound`.
    async fn get_object(&self, key: &str) -> PolyglotResult<Vec<u8>>;

    /// Lists keys and common prefixes below `prefix`, using `/` as delimiter.
    async fn list_objects(&self, prefix: &str) -> PolyglotResult<ObjectListing>;

    /// Removes one object. Missing keys are not an error.
    async fn delete_object(&self, key: &str) -> PolyglotResult<()>;

    /// Removes every object below `prefix` and returns how many were removed.
    async fn delete_objects(&self, prefix: &str) -> PolyglotResult<usize>;

    /// Checks the store is reachable.
    async fn ping(&self) -> PolyglotResult<()>;
}

/// Rejects keys that could address anything outside the store.
///
/// # Errors
///
/// Returns `PolyglotError::Validation` for empty keys, keys with a leading
/// `/`, backslashes, or `..` segments.
pub fn validate_key(key: &str) -> PolyglotResult<()> {
    if key.is_empty() {
        return Err(PolyglotError::validation("Object key must not be empty"));
    }
    if key.starts_with(DELIMITER) || key.contains('\\') || key.split(DELIMITER).any(|s| s == "..") {
        return Err(PolyglotError::Validation(format!("Invalid object key '{}'", key)));
    }
    Ok(())
}
