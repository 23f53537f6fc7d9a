//! Filesystem cache backend.
//!
//! Each entry is a blob file named after [`CacheKey::file_name`] plus a
//! sidecar holding its hex MD5. The blob's mtime is the entry's creation
//! time. Both files are written through a temporary file and a rename, blob
//! first, so a reader never sees a partially written file; a blob whose
//! checksum does not match its sidecar is treated as a miss.

use super::cache_keys::{self, CHECKSUM_SUFFIX};
use super::TranslationCache;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polyglot_core::{checksum, CacheItem, CacheKey, PolyglotError, PolyglotResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

const TEMP_PREFIX: &str = ".tmp-";
const PING_FILE: &str = ".ping";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cache store backed by a local directory.
pub struct FilesystemCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FilesystemCache {
    /// Opens the cache, creating `dir` recursively when missing.
    pub async fn new(dir: impl Into<PathBuf>, ttl: Duration) -> PolyglotResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            PolyglotError::Cache(format!(
                "Failed to create cache directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        debug!(dir = %dir.display(), ttl_secs = ttl.as_secs(), "Filesystem cache ready");
        Ok(Self { dir, ttl })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Blob and sidecar paths of a key.
    fn paths(&self, key: &CacheKey) -> PolyglotResult<(PathBuf, PathBuf)> {
        if key.language.is_empty() || key.format.is_empty() {
            return Err(PolyglotError::validation(
                "Cache key language and format must not be empty",
            ));
        }
        if key
            .components()
            .any(|c| c.contains(['/', '\\', '\0']))
        {
            return Err(PolyglotError::Validation(format!(
                "Cache key '{}' contains a path separator",
                key
            )));
        }

        let name = key.file_name();
        let blob = self.dir.join(&name);
        let sidecar = self.dir.join(format!("{}{}", name, CHECKSUM_SUFFIX));
        Ok((blob, sidecar))
    }

    async fn read_blob(path: &Path) -> std::io::Result<(Vec<u8>, DateTime<Utc>)> {
        let mut file = tokio::fs::File::open(path).await?;
        let modified = file.metadata().await?.modified()?;

        let mut data = Vec::new();
        file.read_to_end(&mut data).await?;
        Ok((data, DateTime::<Utc>::from(modified)))
    }

    /// Removes an expired entry unless a writer has renamed a new blob into
    /// place since it was read. Returns `true` when the entry was removed.
    async fn remove_expired(
        blob: &Path,
        sidecar: &Path,
        observed: DateTime<Utc>,
    ) -> std::io::Result<bool> {
        let current = match tokio::fs::metadata(blob).await {
            Ok(meta) => DateTime::<Utc>::from(meta.modified()?),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if current != observed {
            return Ok(false);
        }

        remove_if_exists(blob).await?;
        remove_if_exists(sidecar).await?;
        Ok(true)
    }
}

#[async_trait]
impl TranslationCache for FilesystemCache {
    async fn get(&self, key: &CacheKey) -> PolyglotResult<CacheItem> {
        let (blob, sidecar) = self.paths(key)?;

        let (data, created_at) = match Self::read_blob(&blob).await {
            Ok(found) => found,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(PolyglotError::CacheMiss),
            Err(e) => return Err(cache_error("read", key, &e)),
        };

        let item = CacheItem {
            created_at,
            checksum: checksum(&data),
            data,
        };

        if item.expires_at(self.ttl) < Utc::now() {
            debug!(key = %key, "Cache entry expired");
            if let Err(e) = Self::remove_expired(&blob, &sidecar, item.created_at).await {
                warn!(key = %key, error = %e, "Failed to remove expired cache entry");
            }
            return Err(PolyglotError::CacheMiss);
        }

        let expected = match tokio::fs::read_to_string(&sidecar).await {
            Ok(expected) => expected,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "Cache entry has no checksum");
                return Err(PolyglotError::CacheMiss);
            }
            Err(e) => return Err(cache_error("read checksum of", key, &e)),
        };

        if expected.trim() != item.checksum {
            debug!(key = %key, "Cache entry checksum mismatch");
            return Err(PolyglotError::CacheMiss);
        }

        Ok(item)
    }

    async fn set(&self, key: &CacheKey, data: &[u8]) -> PolyglotResult<String> {
        let (blob, sidecar) = self.paths(key)?;
        let sum = checksum(data);

        write_atomic(&self.dir, &blob, data)
            .await
            .map_err(|e| cache_error("write", key, &e))?;
        write_atomic(&self.dir, &sidecar, sum.as_bytes())
            .await
            .map_err(|e| cache_error("write checksum of", key, &e))?;

        debug!(key = %key, checksum = %sum, "Cached translation");
        Ok(sum)
    }

    async fn purge(&self, project_id: u64, language: Option<&str>) -> PolyglotResult<()> {
        let prefix = cache_keys::file_prefix(project_id, language);

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            PolyglotError::Cache(format!("Failed to list cache directory: {}", e))
        })?;

        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PolyglotError::Cache(format!("Failed to list cache directory: {}", e)))?
        {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(&prefix) {
                continue;
            }
            remove_if_exists(&entry.path()).await.map_err(|e| {
                PolyglotError::Cache(format!(
                    "Failed to remove cache file '{}': {}",
                    name.to_string_lossy(),
                    e
                ))
            })?;
            removed += 1;
        }

        debug!(project_id, language = ?language, removed, "Purged filesystem cache");
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn ping(&self) -> PolyglotResult<()> {
        let marker = self.dir.join(PING_FILE);
        write_atomic(&self.dir, &marker, b"ping")
            .await
            .map_err(|e| PolyglotError::Cache(format!("Cache directory is not writable: {}", e)))?;
        remove_if_exists(&marker)
            .await
            .map_err(|e| PolyglotError::Cache(format!("Failed to remove ping file: {}", e)))
    }

    fn backend(&self) -> &'static str {
        "filesystem"
    }
}

async fn write_atomic(dir: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp = dir.join(format!(
        "{}{}-{}",
        TEMP_PREFIX,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    tokio::fs::write(&temp, data).await?;

    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e);
    }
    Ok(())
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn cache_error(action: &str, key: &CacheKey, err: &std::io::Error) -> PolyglotError {
    PolyglotError::Cache(format!("Failed to {} cache entry '{}': {}", action, key, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyglot_core::VersionLabel;
    use std::time::SystemTime;
    use tempfile::TempDir;

    async fn cache(ttl: Duration) -> (TempDir, FilesystemCache) {
        let dir = TempDir::new().unwrap();
        let cache = FilesystemCache::new(dir.path().join("cache"), ttl).await.unwrap();
        (dir, cache)
    }

    fn backdate(path: &Path, age: Duration) {
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_dir, cache) = cache(Duration::from_secs(3600)).await;
        let key = CacheKey::new(42, "en", "key_value_json");

        let sum = cache.set(&key, br#"{"k":"v"}"#).await.unwrap();
        let item = cache.get(&key).await.unwrap();

        assert_eq!(item.data, br#"{"k":"v"}"#);
        assert_eq!(item.checksum, sum);
        assert_eq!(sum, checksum(br#"{"k":"v"}"#));
        assert!(item.created_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_checksum_is_stable_across_instances() {
        let dir = TempDir::new().unwrap();
        let key = CacheKey::new(1, "de", "po");

        let first = FilesystemCache::new(dir.path(), Duration::from_secs(60)).await.unwrap();
        let a = first.set(&key, b"msgid").await.unwrap();
        let second = FilesystemCache::new(dir.path(), Duration::from_secs(60)).await.unwrap();
        let b = second.set(&key, b"msgid").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(second.get(&key).await.unwrap().checksum, a);
    }

    #[tokio::test]
    async fn test_unknown_key_is_miss() {
        let (_dir, cache) = cache(Duration::from_secs(60)).await;
        let err = cache.get(&CacheKey::new(1, "en", "po")).await.unwrap_err();
        assert!(err.is_cache_miss());
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss_and_removed() {
        let (_dir, cache) = cache(Duration::from_secs(3600)).await;
        let key = CacheKey::new(1, "en", "po");
        cache.set(&key, b"old").await.unwrap();

        let (blob, sidecar) = cache.paths(&key).unwrap();
        backdate(&blob, Duration::from_secs(7200));

        assert!(cache.get(&key).await.unwrap_err().is_cache_miss());
        assert!(!blob.exists());
        assert!(!sidecar.exists());
    }

    #[tokio::test]
    async fn test_expired_removal_spares_rewritten_entry() {
        let (_dir, cache) = cache(Duration::from_secs(3600)).await;
        let key = CacheKey::new(1, "en", "po");
        cache.set(&key, b"old").await.unwrap();

        let (blob, sidecar) = cache.paths(&key).unwrap();
        backdate(&blob, Duration::from_secs(7200));
        let stale_mtime = DateTime::<Utc>::from(std::fs::metadata(&blob).unwrap().modified().unwrap());

        cache.set(&key, b"new").await.unwrap();

        let removed = FilesystemCache::remove_expired(&blob, &sidecar, stale_mtime)
            .await
            .unwrap();
        assert!(!removed);
        assert_eq!(cache.get(&key).await.unwrap().data, b"new");
    }

    #[tokio::test]
    async fn test_tag_boundaries_do_not_collide() {
        let (_dir, cache) = cache(Duration::from_secs(3600)).await;
        let joined = CacheKey::new(7, "en", "po").with_tags(["a_b"]);
        let split = CacheKey::new(7, "en", "po").with_tags(["a", "b"]);

        cache.set(&joined, b"only-a_b").await.unwrap();
        assert!(cache.get(&split).await.unwrap_err().is_cache_miss());

        cache.set(&split, b"a-and-b").await.unwrap();
        assert_eq!(cache.get(&joined).await.unwrap().data, b"only-a_b");
        assert_eq!(cache.get(&split).await.unwrap().data, b"a-and-b");
    }

    #[tokio::test]
    async fn test_missing_or_mismatched_sidecar_is_miss() {
        let (_dir, cache) = cache(Duration::from_secs(3600)).await;
        let key = CacheKey::new(1, "en", "po");
        cache.set(&key, b"data").await.unwrap();
        let (blob, sidecar) = cache.paths(&key).unwrap();

        std::fs::write(&sidecar, "0000").unwrap();
        assert!(cache.get(&key).await.unwrap_err().is_cache_miss());

        std::fs::remove_file(&sidecar).unwrap();
        assert!(cache.get(&key).await.unwrap_err().is_cache_miss());
        assert!(blob.exists());
    }

    #[tokio::test]
    async fn test_purge_language_leaves_siblings() {
        let (_dir, cache) = cache(Duration::from_secs(3600)).await;
        let en = CacheKey::new(7, "en", "po");
        let en_pinned = CacheKey::new(7, "en", "po").with_version(VersionLabel::Pinned("v1".into()));
        let en_us = CacheKey::new(7, "en-us", "po");
        let other_project = CacheKey::new(77, "en", "po");

        for key in [&en, &en_pinned, &en_us, &other_project] {
            cache.set(key, b"x").await.unwrap();
        }

        cache.purge(7, Some("en")).await.unwrap();

        assert!(cache.get(&en).await.unwrap_err().is_cache_miss());
        assert!(cache.get(&en_pinned).await.unwrap_err().is_cache_miss());
        assert!(cache.get(&en_us).await.is_ok());
        assert!(cache.get(&other_project).await.is_ok());

        cache.purge(7, None).await.unwrap();
        assert!(cache.get(&en_us).await.unwrap_err().is_cache_miss());
        assert!(cache.get(&other_project).await.is_ok());

        cache.purge(123, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_separators() {
        let (_dir, cache) = cache(Duration::from_secs(60)).await;
        let key = CacheKey::new(1, "../etc", "po");
        let err = cache.set(&key, b"x").await.unwrap_err();
        assert!(matches!(err, PolyglotError::Validation(_)));
    }

    #[tokio::test]
    async fn test_ping() {
        let (_dir, cache) = cache(Duration::from_secs(60)).await;
        cache.ping().await.unwrap();
        assert!(!cache.dir().join(PING_FILE).exists());
        assert_eq!(cache.backend(), "filesystem");
    }
}
