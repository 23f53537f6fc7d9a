//! Version snapshots written through a bounded worker pool.

use crate::cache::TranslationCache;
use crate::dto::{CreateVersionRequest, VersionResponse};
use crate::metrics::TranslationMetrics;
use crate::version_service::VersionService;
use async_trait::async_trait;
use polyglot_core::{
    project_prefix, validate_version_name, ContentMeta, PolyglotError, PolyglotResult, Version,
};
use polyglot_storage::ObjectStorage;
use polyglot_upstream::{ExportRequest, TranslationClient};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use validator::Validate;

/// One (language, format) file of a snapshot.
#[derive(Debug, Clone)]
struct SnapshotJob {
    project_id: u64,
    language: String,
    meta: &'static ContentMeta,
}

impl SnapshotJob {
    async fn run(
        self,
        version: &Version,
        client: &dyn TranslationClient,
        storage: &dyn ObjectStorage,
    ) -> PolyglotResult<()> {
        let url = client
            .export_project(ExportRequest::translated(
                self.project_id,
                &self.language,
                self.meta.format,
                &[],
            ))
            .await?;
        let data = client.download(&url).await?;

        let metadata = HashMap::from([
            ("project".to_string(), self.project_id.to_string()),
            ("language".to_string(), self.language.clone()),
            ("format".to_string(), self.meta.format.to_string()),
            ("version".to_string(), version.name.clone()),
        ]);

        storage
            .put_object(
                &version.object_key(self.project_id, self.meta, &self.language),
                data,
                metadata,
                self.meta.mime_type,
            )
            .await?;

        debug!(
            project_id = self.project_id,
            language = %self.language,
            format = self.meta.format,
            version = %version.name,
            "Stored snapshot file"
        );
        Ok(())
    }
}

/// `(project, name)` pairs whose snapshot is still being written.
type Reservations = Arc<Mutex<HashSet<(u64, String)>>>;

/// Holds a version name for one project until dropped.
///
/// Storage only lists a version once its snapshot exists, so concurrent
/// creations of the same name are serialized here instead.
struct NameReservation {
    reservations: Reservations,
    key: (u64, String),
}

impl NameReservation {
    fn acquire(reservations: &Reservations, project_id: u64, name: &str) -> Option<Self> {
        let key = (project_id, name.to_string());
        let inserted = reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
        inserted.then(|| Self {
            reservations: Arc::clone(reservations),
            key,
        })
    }
}

impl Drop for NameReservation {
    fn drop(&mut self) {
        self.reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Version service over an object store.
pub struct VersionServiceImpl {
    client: Arc<dyn TranslationClient>,
    storage: Arc<dyn ObjectStorage>,
    cache: Arc<dyn TranslationCache>,
    worker_count: usize,
    default_formats: Vec<String>,
    reservations: Reservations,
}

impl VersionServiceImpl {
    /// Creates a new version service.
    pub fn new(
        client: Arc<dyn TranslationClient>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<dyn TranslationCache>,
        worker_count: usize,
        default_formats: Vec<String>,
    ) -> Self {
        Self {
            client,
            storage,
            cache,
            worker_count: worker_count.max(1),
            default_formats,
            reservations: Reservations::default(),
        }
    }

    fn resolve_formats(&self, requested: Option<Vec<String>>) -> PolyglotResult<Vec<&'static ContentMeta>> {
        let names = match requested {
            Some(names) if !names.is_empty() => names,
            _ => self.default_formats.clone(),
        };

        let mut formats: Vec<&'static ContentMeta> = Vec::with_capacity(names.len());
        for name in &names {
            let meta = ContentMeta::for_format(name)?;
            if !formats.iter().any(|m| m.format == meta.format) {
                formats.push(meta);
            }
        }
        if formats.is_empty() {
            return Err(PolyglotError::validation("At least one format is required"));
        }
        Ok(formats)
    }

    /// Every decodable version of a project, newest first.
    async fn versions(&self, project_id: u64) -> PolyglotResult<Vec<(Version, String)>> {
        let listing = self.storage.list_objects(&project_prefix(project_id)).await?;

        let mut versions: Vec<(Version, String)> = listing
            .common_prefixes
            .into_iter()
            .filter_map(|prefix| match Version::from_prefix(&prefix) {
                Ok(version) => Some((version, prefix)),
                Err(e) => {
                    warn!(project_id, prefix = %prefix, error = %e, "Skipping undecodable version prefix");
                    None
                }
            })
            .collect();

        versions.sort_by(|(a, _), (b, _)| {
            b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name))
        });
        Ok(versions)
    }

    /// Runs every job, at most `worker_count` at a time.
    ///
    /// The first failure aborts the jobs still queued or running and removes
    /// whatever was already written under the version prefix.
    async fn run_snapshot(&self, version: Arc<Version>, jobs: Vec<SnapshotJob>, prefix: String) -> PolyglotResult<()> {
        let total = jobs.len();
        let permits = Arc::new(Semaphore::new(self.worker_count));
        let mut set = JoinSet::new();

        for job in jobs {
            let permits = Arc::clone(&permits);
            let client = Arc::clone(&self.client);
            let storage = Arc::clone(&self.storage);
            let version = Arc::clone(&version);
            set.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| PolyglotError::Cancelled)?;
                job.run(&version, client.as_ref(), storage.as_ref()).await
            });
        }

        let mut failed = 0usize;
        let mut first_error: Option<PolyglotError> = None;

        while let Some(joined) = set.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) if e.is_cancelled() && first_error.is_some() => continue,
                Err(e) => Err(join_error(&e)),
            };

            match result {
                Ok(()) => TranslationMetrics::snapshot_job("success"),
                Err(e) => {
                    TranslationMetrics::snapshot_job("failed");
                    failed += 1;
                    if first_error.is_none() {
                        error!(version = %version.name, error = %e, "Snapshot job failed, aborting the rest");
                        set.abort_all();
                        first_error = Some(e);
                    }
                }
            }
        }

        let Some(source) = first_error else {
            return Ok(());
        };

        match self.storage.delete_objects(&prefix).await {
            Ok(removed) => info!(prefix = %prefix, removed, "Removed partial snapshot"),
            Err(e) => error!(prefix = %prefix, error = %e, "Failed to remove partial snapshot"),
        }

        Err(PolyglotError::SnapshotFailed {
            failed,
            total,
            source: Box::new(source),
        })
    }
}

fn join_error(err: &JoinError) -> PolyglotError {
    if err.is_cancelled() {
        PolyglotError::Cancelled
    } else {
        PolyglotError::Internal(format!("Snapshot job panicked: {}", err))
    }
}

#[async_trait]
impl VersionService for VersionServiceImpl {
    async fn create_version(
        &self,
        project_id: u64,
        request: CreateVersionRequest,
    ) -> PolyglotResult<VersionResponse> {
        debug!(project_id, name = %request.name, "Creating version");

        request
            .validate()
            .map_err(|e| PolyglotError::Validation(e.to_string()))?;
        validate_version_name(&request.name)?;
        let formats = self.resolve_formats(request.formats)?;

        let reservation = NameReservation::acquire(&self.reservations, project_id, &request.name)
            .ok_or_else(|| PolyglotError::VersionAlreadyExists {
                project_id,
                name: request.name.clone(),
            })?;

        if self
            .versions(project_id)
            .await?
            .iter()
            .any(|(version, _)| version.name == request.name)
        {
            return Err(PolyglotError::VersionAlreadyExists {
                project_id,
                name: request.name,
            });
        }

        let languages = self.client.list_project_languages(project_id).await?;
        if languages.is_empty() {
            return Err(PolyglotError::Validation(format!(
                "Project {} has no languages",
                project_id
            )));
        }

        let version = Arc::new(Version::new(request.name));
        let prefix = version.prefix(project_id);
        let jobs: Vec<SnapshotJob> = languages
            .iter()
            .flat_map(|language| {
                formats.iter().map(move |meta| SnapshotJob {
                    project_id,
                    language: language.code.clone(),
                    meta: *meta,
                })
            })
            .collect();
        let job_count = jobs.len();

        // Detached so that a dropped request neither leaves a partial
        // snapshot behind nor skips its cleanup.
        let worker = Self {
            client: Arc::clone(&self.client),
            storage: Arc::clone(&self.storage),
            cache: Arc::clone(&self.cache),
            worker_count: self.worker_count,
            default_formats: Vec::new(),
            reservations: Arc::clone(&self.reservations),
        };
        let snapshot_version = Arc::clone(&version);
        tokio::spawn(async move {
            let _reservation = reservation;
            worker.run_snapshot(snapshot_version, jobs, prefix).await
        })
            .await
            .map_err(|e| join_error(&e))??;

        info!(
            project_id,
            version = %version.name,
            id = %version.id,
            files = job_count,
            "Created version"
        );
        Ok(VersionResponse::from((*version).clone()))
    }

    async fn list_versions(&self, project_id: u64) -> PolyglotResult<Vec<VersionResponse>> {
        Ok(self
            .versions(project_id)
            .await?
            .into_iter()
            .map(|(version, _)| VersionResponse::from(version))
            .collect())
    }

    async fn delete_version(&self, project_id: u64, version_id: &str) -> PolyglotResult<()> {
        let not_found = || PolyglotError::VersionNotFound {
            project_id,
            version_id: version_id.to_string(),
        };
        let id = Uuid::parse_str(version_id).map_err(|_| not_found())?;

        let (version, prefix) = self
            .versions(project_id)
            .await?
            .into_iter()
            .find(|(version, _)| version.id == id)
            .ok_or_else(not_found)?;

        let removed = self.storage.delete_objects(&prefix).await?;
        self.cache.purge(project_id, None).await?;

        info!(project_id, version = %version.name, removed, "Deleted version");
        Ok(())
    }

    async fn check_storage(&self) -> PolyglotResult<()> {
        self.storage.ping().await
    }
}
