//! Cache store contract shared by every backend.

use async_trait::async_trait;
use polyglot_core::{CacheItem, CacheKey, Interface, PolyglotResult};
use std::time::Duration;

/// Store of translation payloads keyed by [`CacheKey`].
///
/// Implementations are shared as `Arc<dyn TranslationCache>` and must be safe
/// for concurrent use without extra locking. Same-key writes are
/// last-writer-wins.
#[async_trait]
pub trait TranslationCache: Interface + Send + Sync {
    /// Reads an entry.
    ///
    /// Returns `PolyglotError::CacheMiss` when the key was never written, its
    /// TTL elapsed or its stored form is incomplete. Any other failure is
    /// `PolyglotError::Cache`.
    async fn get(&self, key: &CacheKey) -> PolyglotResult<CacheItem>;

    /// Stores `data` under `key`, replacing any previous entry, and returns
    /// its checksum.
    async fn set(&self, key: &CacheKey, data: &[u8]) -> PolyglotResult<String>;

    /// Removes every entry of a project, or of one of its languages.
    ///
    /// Purging nothing is not an error.
    async fn purge(&self, project_id: u64, language: Option<&str>) -> PolyglotResult<()>;

    /// Lifetime of an entry, fixed at construction.
    fn ttl(&self) -> Duration;

    /// Liveness check.
    async fn ping(&self) -> PolyglotResult<()>;

    /// Short backend name for logs and metrics.
    fn backend(&self) -> &'static str;
}
