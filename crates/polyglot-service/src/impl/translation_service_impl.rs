//! Pull-through translation lookups with stale-while-revalidate refresh.

use crate::cache::TranslationCache;
use crate::metrics::TranslationMetrics;
use crate::translation_service::{TranslationRequest, TranslationService};
use async_trait::async_trait;
use chrono::Utc;
use polyglot_core::{
    object_key, project_prefix, CacheKey, ContentMeta, PolyglotError, PolyglotResult,
    Translation, Version, VersionLabel,
};
use polyglot_storage::ObjectStorage;
use polyglot_upstream::{ExportRequest, TranslationClient};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, info_span, Instrument};

/// Fetches a translation from its source and writes it to the cache.
#[derive(Clone)]
struct TranslationFetcher {
    client: Arc<dyn TranslationClient>,
    cache: Arc<dyn TranslationCache>,
    storage: Arc<dyn ObjectStorage>,
}

impl TranslationFetcher {
    async fn fetch(&self, key: &CacheKey) -> PolyglotResult<Translation> {
        let started = Instant::now();
        let (source, result) = match &key.version {
            VersionLabel::Latest => ("upstream", self.fetch_latest(key).await),
            VersionLabel::Pinned(name) => ("storage", self.fetch_pinned(key, name).await),
        };
        TranslationMetrics::fetch(source, started.elapsed(), result.is_ok());

        let data = result?;
        let checksum = self.cache.set(key, &data).await?;

        Ok(Translation {
            data,
            checksum,
            ttl: self.cache.ttl(),
        })
    }

    async fn fetch_latest(&self, key: &CacheKey) -> PolyglotResult<Vec<u8>> {
        let url = self
            .client
            .export_project(ExportRequest::translated(
                key.project_id,
                &key.language,
                &key.format,
                key.tags(),
            ))
            .await?;

        self.client.download(&url).await
    }

    async fn fetch_pinned(&self, key: &CacheKey, name: &str) -> PolyglotResult<Vec<u8>> {
        let not_found = || PolyglotError::NotFoundInStorage {
            project_id: key.project_id,
            language_code: key.language.clone(),
            version: name.to_string(),
        };

        let listing = self
            .storage
            .list_objects(&project_prefix(key.project_id))
            .await?;

        let prefix = listing
            .common_prefixes
            .iter()
            .filter_map(|prefix| {
                Version::from_prefix(prefix)
                    .ok()
                    .filter(|version| version.name == name)
                    .map(|version| (version.created_at, prefix))
            })
            .max_by_key(|(created_at, _)| *created_at)
            .map(|(_, prefix)| prefix)
            .ok_or_else(not_found)?;

        let meta = ContentMeta::for_format(&key.format)?;
        match self
            .storage
            .get_object(&object_key(prefix, meta, &key.language))
            .await
        {
            Ok(data) => Ok(data),
            Err(PolyglotError::NotFound { .. }) => Err(not_found()),
            Err(e) => Err(e),
        }
    }
}

/// Translation service over one cache store.
///
/// Holds a single refresh permit: at most one background refresh runs at a
/// time across all keys.
pub struct TranslationServiceImpl {
    fetcher: TranslationFetcher,
    renewal_threshold: Duration,
    refresh_permit: Arc<Semaphore>,
}

impl TranslationServiceImpl {
    /// Creates a new translation service.
    pub fn new(
        client: Arc<dyn TranslationClient>,
        cache: Arc<dyn TranslationCache>,
        storage: Arc<dyn ObjectStorage>,
        renewal_threshold: Duration,
    ) -> Self {
        Self {
            fetcher: TranslationFetcher {
                client,
                cache,
                storage,
            },
            renewal_threshold,
            refresh_permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Starts a background refresh of `key` unless one is already running.
    ///
    /// The task runs in its own root span and outlives the request that
    /// triggered it.
    fn schedule_refresh(&self, key: CacheKey) -> bool {
        let Ok(permit) = Arc::clone(&self.refresh_permit).try_acquire_owned() else {
            debug!(key = %key, "Refresh already in flight, skipping");
            TranslationMetrics::refresh_skipped();
            return false;
        };

        TranslationMetrics::refresh_scheduled();
        let fetcher = self.fetcher.clone();
        let span = info_span!(parent: None, "translation_refresh", key = %key);

        tokio::spawn(
            async move {
                let _permit = permit;
                debug!("Refreshing translation");
                match fetcher.fetch(&key).await {
                    Ok(translation) => {
                        info!(checksum = %translation.checksum, "Refreshed translation");
                    }
                    Err(e) => {
                        TranslationMetrics::refresh_failed();
                        error!(error = %e, "Failed to refresh translation");
                    }
                }
            }
            .instrument(span),
        );
        true
    }
}

#[async_trait]
impl TranslationService for TranslationServiceImpl {
    async fn get_translation(&self, request: TranslationRequest) -> PolyglotResult<Translation> {
        let key = request.cache_key();
        let cache = &self.fetcher.cache;
        let ttl = cache.ttl();

        match cache.get(&key).await {
            Ok(item) => {
                TranslationMetrics::cache_hit(cache.backend());
                if key.version.is_latest()
                    && item.is_due_for_renewal(ttl, self.renewal_threshold, Utc::now())
                {
                    self.schedule_refresh(key);
                }
                Ok(Translation::from_item(item, ttl))
            }
            Err(e) if e.is_cache_miss() => {
                TranslationMetrics::cache_miss(cache.backend());
                debug!(key = %key, "Cache miss, fetching");
                self.fetcher.fetch(&key).await
            }
            Err(e) => {
                error!(key = %key, error = %e, "Cache lookup failed");
                Err(e)
            }
        }
    }

    async fn purge_translation(&self, project_id: u64, language: &str) -> PolyglotResult<()> {
        info!(project_id, language, "Purging cached translation");
        self.fetcher.cache.purge(project_id, Some(language)).await
    }

    async fn purge_project(&self, project_id: u64) -> PolyglotResult<()> {
        info!(project_id, "Purging cached project");
        self.fetcher.cache.purge(project_id, None).await
    }

    async fn check_cache(&self) -> PolyglotResult<()> {
        self.fetcher.cache.ping().await
    }
}
