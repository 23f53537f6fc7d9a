//! Component wiring and listener lifecycle.

use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use polyglot_config::{AppConfig, CacheBackend, CacheConfig};
use polyglot_core::{PolyglotError, PolyglotResult};
use polyglot_rest::{create_private_router, create_public_router, AppState};
use polyglot_service::{
    create_pool, metrics::register_metrics, FilesystemCache, ProjectServiceImpl, RedisCache,
    TranslationCache, TranslationServiceImpl, VersionServiceImpl,
};
use polyglot_storage::{LocalObjectStorage, ObjectStorage};
use polyglot_upstream::{PoEditorClient, TranslationClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{error, info, warn};

/// Installs the global Prometheus recorder and describes every metric.
pub fn install_metrics() -> PolyglotResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PolyglotError::Configuration(format!("Failed to install metrics recorder: {}", e)))?;
    register_metrics();
    Ok(handle)
}

/// Creates the cache backend selected in configuration.
pub async fn build_cache(config: &CacheConfig) -> PolyglotResult<Arc<dyn TranslationCache>> {
    let cache: Arc<dyn TranslationCache> = match config.backend {
        CacheBackend::Filesystem => {
            info!(dir = %config.filesystem.dir.display(), "Using filesystem cache");
            Arc::new(FilesystemCache::new(&config.filesystem.dir, config.ttl()).await?)
        }
        CacheBackend::Redis => {
            info!("Using Redis cache");
            let pool = create_pool(&config.redis).await?;
            Arc::new(RedisCache::new(pool, config.ttl()))
        }
    };
    Ok(cache)
}

/// Both routers, ready to be served.
pub struct Application {
    public_addr: String,
    private_addr: String,
    grace_period: Duration,
    public_router: Router,
    private_router: Router,
}

impl Application {
    /// Wires cache, upstream client, object storage and services.
    pub async fn build(config: &AppConfig, metrics: Option<PrometheusHandle>) -> PolyglotResult<Self> {
        if config.upstream.api_token.is_empty() {
            warn!("Upstream API token is empty; upstream calls will be rejected");
        }

        let cache = build_cache(&config.cache).await?;
        let client: Arc<dyn TranslationClient> = Arc::new(PoEditorClient::new(
            &config.upstream.base_url,
            config.upstream.api_token.clone(),
            config.upstream.timeout(),
        )?);
        let storage: Arc<dyn ObjectStorage> =
            Arc::new(LocalObjectStorage::new(&config.storage.root_dir).await?);

        Ok(Self::from_components(config, client, cache, storage, metrics))
    }

    /// Builds the routers around already constructed components.
    pub fn from_components(
        config: &AppConfig,
        client: Arc<dyn TranslationClient>,
        cache: Arc<dyn TranslationCache>,
        storage: Arc<dyn ObjectStorage>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let translation_service = Arc::new(TranslationServiceImpl::new(
            client.clone(),
            cache.clone(),
            storage.clone(),
            config.cache.renewal_threshold(),
        ));
        let version_service = Arc::new(VersionServiceImpl::new(
            client.clone(),
            storage.clone(),
            cache,
            config.versions.worker_count,
            config.versions.default_formats.clone(),
        ));
        let project_service = Arc::new(ProjectServiceImpl::new(client, storage));

        let mut state = AppState::new(translation_service, version_service, project_service);
        if let Some(handle) = metrics {
            state = state.with_metrics(handle);
        }

        Self {
            public_addr: config.server.public_addr(),
            private_addr: config.server.private_addr(),
            grace_period: config.server.grace_period(),
            public_router: create_public_router(state.clone(), &config.server),
            private_router: create_private_router(state, config),
        }
    }

    /// Public router, for tests and embedding.
    pub fn public_router(&self) -> Router {
        self.public_router.clone()
    }

    /// Private router, for tests and embedding.
    pub fn private_router(&self) -> Router {
        self.private_router.clone()
    }

    /// Serves both listeners until a shutdown signal arrives or one of them
    /// fails, then drains in-flight requests for at most the grace period.
    pub async fn run(self) -> PolyglotResult<()> {
        let public = bind(&self.public_addr).await?;
        let private = bind(&self.private_addr).await?;
        info!("Public listener on http://{}", self.public_addr);
        info!("Private listener on http://{}", self.private_addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut public_server = tokio::spawn(serve(public, self.public_router, shutdown_rx.clone(), "public"));
        let mut private_server = tokio::spawn(serve(private, self.private_router, shutdown_rx, "private"));

        let early_exit = tokio::select! {
            _ = shutdown_signal() => None,
            result = &mut public_server => Some(flatten(result)),
            result = &mut private_server => Some(flatten(result)),
        };

        let _ = shutdown_tx.send(true);

        if let Some(result) = early_exit {
            error!("A listener stopped unexpectedly, shutting down");
            public_server.abort();
            private_server.abort();
            return result.and(Err(PolyglotError::internal("Listener stopped unexpectedly")));
        }

        info!(grace_secs = self.grace_period.as_secs(), "Draining in-flight requests");
        let drain = async {
            let (public, private) = tokio::join!(&mut public_server, &mut private_server);
            flatten(public).and(flatten(private))
        };

        let drained = tokio::time::timeout(self.grace_period, drain).await;
        match drained {
            Ok(result) => {
                info!("Server shutdown complete");
                result
            }
            Err(_) => {
                warn!("Grace period elapsed, aborting remaining connections");
                public_server.abort();
                private_server.abort();
                Ok(())
            }
        }
    }
}

async fn bind(addr: &str) -> PolyglotResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| PolyglotError::internal(format!("Failed to bind {}: {}", addr, e)))
}

async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
    name: &'static str,
) -> PolyglotResult<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| PolyglotError::internal(format!("{} server error: {}", name, e)))
}

fn flatten(result: Result<PolyglotResult<()>, tokio::task::JoinError>) -> PolyglotResult<()> {
    result.map_err(|e| PolyglotError::internal(format!("Listener task failed: {}", e)))?
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.cache.filesystem.dir = dir.path().join("cache");
        config.storage.root_dir = dir.path().join("versions");
        config.upstream.base_url = "http://127.0.0.1:9".to_string();
        config
    }

    #[tokio::test]
    async fn test_build_filesystem_cache() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let cache = build_cache(&config.cache).await.unwrap();
        assert_eq!(cache.backend(), "filesystem");
        assert_eq!(cache.ttl(), config.cache.ttl());
        assert!(dir.path().join("cache").is_dir());
    }

    #[tokio::test]
    async fn test_build_wires_routers() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);

        let app = Application::build(&config, None).await.unwrap();

        let response = app
            .public_router()
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .private_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .private_router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_startup() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.cache.backend = CacheBackend::Redis;
        config.cache.redis.url = "redis://127.0.0.1:1/0".to_string();

        assert!(build_cache(&config.cache).await.is_err());
    }
}
