//! Directory-backed object storage.
//!
//! Keys map to files below a root directory. Content type and user metadata
//! live in JSON sidecars under `<root>/.meta/<key>.json` so object files hold
//! only the payload.

use crate::{validate_key, ObjectListing, ObjectStorage, DELETE_BATCH_SIZE, DELIMITER};
use async_trait::async_trait;
use polyglot_core::{PolyglotError, PolyglotResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

const META_DIR: &str = ".meta";
const TEMP_PREFIX: &str = ".polyglot-tmp-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stored alongside every object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub content_type: String,
    pub size: u64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Object storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    /// Opens the store, creating the root directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> PolyglotResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            PolyglotError::Storage(format!(
                "Failed to create storage root '{}': {}",
                root.display(),
                e
            ))
        })?;

        info!(root = %root.display(), "Local object storage ready");
        Ok(Self { root })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the metadata sidecar of an object.
    pub async fn head_object(&self, key: &str) -> PolyglotResult<ObjectMeta> {
        Self::check_key(key)?;
        let raw = match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PolyglotError::not_found("object", key));
            }
            Err(e) => return Err(storage_error("read metadata of", key, &e)),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    fn check_key(key: &str) -> PolyglotResult<()> {
        validate_key(key)?;
        if key.split(DELIMITER).next() == Some(META_DIR) {
            return Err(PolyglotError::Validation(format!("Invalid object key '{}'", key)));
        }
        Ok(())
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(META_DIR).join(format!("{}.json", key))
    }

    /// Directory that holds every key starting with `prefix`.
    fn base_dir(&self, prefix: &str) -> PathBuf {
        match prefix.rfind(DELIMITER) {
            Some(idx) => self.root.join(&prefix[..idx]),
            None => self.root.clone(),
        }
    }

    /// Converts a file path below the root back into its key.
    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
        Some(parts?.join("/"))
    }

    /// Every key stored below `dir`, in no particular order.
    async fn walk(&self, dir: PathBuf) -> PolyglotResult<Vec<String>> {
        let meta_root = self.root.join(META_DIR);
        let mut keys = Vec::new();
        let mut pending = vec![dir];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(PolyglotError::Storage(format!(
                        "Failed to list '{}': {}",
                        dir.display(),
                        e
                    )))
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| PolyglotError::Storage(format!("Failed to list '{}': {}", dir.display(), e)))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| PolyglotError::Storage(format!("Failed to stat '{}': {}", path.display(), e)))?;

                if file_type.is_dir() {
                    if path != meta_root {
                        pending.push(path);
                    }
                } else if !entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
                    if let Some(key) = self.key_for(&path) {
                        keys.push(key);
                    }
                }
            }
        }

        Ok(keys)
    }

    /// Removes now-empty directories from `dir` up to (excluding) `stop`.
    async fn prune_empty_dirs(dir: &Path, stop: &Path) {
        let mut current = Some(dir.to_path_buf());
        while let Some(dir) = current {
            if dir == stop || !dir.starts_with(stop) {
                break;
            }
            if tokio::fs::remove_dir(&dir).await.is_err() {
                break;
            }
            current = dir.parent().map(Path::to_path_buf);
        }
    }
}

/// Writes through a temporary file in the target directory, then renames.
async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "path has no parent"))?;
    tokio::fs::create_dir_all(parent).await?;

    let temp = parent.join(format!(
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

fn storage_error(action: &str, key: &str, err: &std::io::Error) -> PolyglotError {
    PolyglotError::Storage(format!("Failed to {} object '{}': {}", action, key, err))
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        metadata: HashMap<String, String>,
        content_type: &str,
    ) -> PolyglotResult<()> {
        Self::check_key(key)?;

        let meta = ObjectMeta {
            content_type: content_type.to_string(),
            size: data.len() as u64,
            metadata,
        };
        let meta = serde_json::to_vec(&meta)?;

        write_atomic(&self.object_path(key), &data)
            .await
            .map_err(|e| storage_error("write", key, &e))?;
        write_atomic(&self.meta_path(key), &meta)
            .await
            .map_err(|e| storage_error("write metadata of", key, &e))?;

        debug!(key = %key, size = data.len(), "Stored object");
        Ok(())
    }

    async fn get_object(&self, key: &str) -> PolyglotResult<Vec<u8>> {
        Self::check_key(key)?;

        let path = self.object_path(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(PolyglotError::not_found("object", key)),
            Err(e) => {
                // A directory is a prefix, not an object
                let is_dir = tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false);
                if is_dir {
                    Err(PolyglotError::not_found("object", key))
                } else {
                    Err(storage_error("read", key, &e))
                }
            }
        }
    }

    async fn list_objects(&self, prefix: &str) -> PolyglotResult<ObjectListing> {
        if !prefix.is_empty() {
            Self::check_key(prefix)?;
        }

        let mut common_prefixes = BTreeSet::new();
        let mut contents = BTreeSet::new();

        for key in self.walk(self.base_dir(prefix)).await? {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            match rest.find(DELIMITER) {
                Some(idx) => {
                    common_prefixes.insert(format!("{}{}", prefix, &rest[..=idx]));
                }
                None => {
                    contents.insert(key.clone());
                }
            }
        }

        Ok(ObjectListing {
            common_prefixes: common_prefixes.into_iter().collect(),
            contents: contents.into_iter().collect(),
        })
    }

    async fn delete_object(&self, key: &str) -> PolyglotResult<()> {
        Self::check_key(key)?;

        remove_if_exists(&self.object_path(key))
            .await
            .map_err(|e| storage_error("delete", key, &e))?;
        remove_if_exists(&self.meta_path(key))
            .await
            .map_err(|e| storage_error("delete metadata of", key, &e))?;

        Ok(())
    }

    async fn delete_objects(&self, prefix: &str) -> PolyglotResult<usize> {
        Self::check_key(prefix)?;

        let mut keys: Vec<String> = self
            .walk(self.base_dir(prefix))
            .await?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();

        let mut deleted = 0;
        for batch in keys.chunks(DELETE_BATCH_SIZE) {
            for key in batch {
                self.delete_object(key).await?;
            }
            deleted += batch.len();
            debug!(prefix = %prefix, batch = batch.len(), "Deleted object batch");
        }

        if prefix.ends_with(DELIMITER) {
            let trimmed = prefix.trim_end_matches(DELIMITER);
            let meta_root = self.root.join(META_DIR);
            for (dir, stop) in [
                (self.root.join(trimmed), self.root.clone()),
                (meta_root.join(trimmed), meta_root.clone()),
            ] {
                if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                    if e.kind() != ErrorKind::NotFound {
                        warn!(dir = %dir.display(), error = %e, "Failed to remove prefix directory");
                    }
                }
                if let Some(parent) = dir.parent() {
                    Self::prune_empty_dirs(parent, &stop).await;
                }
            }
        }

        if deleted == 0 {
            warn!(prefix = %prefix, "No objects matched prefix");
        } else {
            info!(prefix = %prefix, deleted, "Deleted objects");
        }
        Ok(deleted)
    }

    async fn ping(&self) -> PolyglotResult<()> {
        let meta = tokio::fs::metadata(&self.root).await.map_err(|e| {
            PolyglotError::Storage(format!("Storage root '{}' unavailable: {}", self.root.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(PolyglotError::Storage(format!(
                "Storage root '{}' is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }
}
