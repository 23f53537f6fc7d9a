//! Application configuration structures.

use polyglot_core::telemetry::{LogFormat, TelemetryConfig};
use polyglot_core::DEFAULT_FORMAT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Translation cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Upstream translation provider.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Object storage for version snapshots.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Version snapshot settings.
    #[serde(default)]
    pub versions: VersionsConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "polyglot".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

impl AppMetadata {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// Server configuration.
///
/// The public listener serves translations only; the private listener carries
/// health, metrics and the management API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host for both listeners.
    pub host: String,
    /// Public (translation) port.
    pub public_port: u16,
    /// Private (management) port.
    pub private_port: u16,
    /// Time allowed for in-flight requests after a shutdown signal.
    pub grace_period_secs: u64,
    /// Enable CORS.
    pub cors_enabled: bool,
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            public_port: 8000,
            private_port: 8001,
            grace_period_secs: 10,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Returns the public listener address.
    #[must_use]
    pub fn public_addr(&self) -> String {
        format!("{}:{}", self.host, self.public_port)
    }

    /// Returns the private listener address.
    #[must_use]
    pub fn private_addr(&self) -> String {
        format!("{}:{}", self.host, self.private_port)
    }

    /// Returns the shutdown grace period as a Duration.
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Which cache backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Filesystem,
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filesystem => f.write_str("filesystem"),
            Self::Redis => f.write_str("redis"),
        }
    }
}

/// Translation cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend selected at startup.
    pub backend: CacheBackend,
    /// Lifetime of a cached translation.
    pub ttl_secs: u64,
    /// Remaining lifetime below which a hit triggers a background refresh.
    pub renewal_threshold_secs: u64,
    /// Filesystem backend settings.
    pub filesystem: FilesystemCacheConfig,
    /// Redis backend settings.
    pub redis: RedisConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Filesystem,
            ttl_secs: 3600,
            renewal_threshold_secs: 1800,
            filesystem: FilesystemCacheConfig::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Returns the cache TTL as a Duration.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns the renewal threshold as a Duration.
    #[must_use]
    pub const fn renewal_threshold(&self) -> Duration {
        Duration::from_secs(self.renewal_threshold_secs)
    }
}

/// Filesystem cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemCacheConfig {
    /// Directory holding cached blobs and their checksum sidecars.
    pub dir: PathBuf,
}

impl Default for FilesystemCacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

/// `$XDG_CACHE_HOME/polyglot`, then `$HOME/.cache/polyglot`, then `./.cache/polyglot`.
fn default_cache_dir() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".cache"))
        })
        .unwrap_or_else(|| PathBuf::from("./.cache"))
        .join("polyglot")
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL.
    pub url: String,
    /// Connection pool size.
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/1".to_string(),
            pool_size: 16,
        }
    }
}

/// Upstream translation provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the provider API.
    pub base_url: String,
    /// API token sent with every call.
    pub api_token: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.poeditor.com".to_string(),
            api_token: String::new(),
            timeout_secs: 30,
        }
    }
}

impl UpstreamConfig {
    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the local object store.
    pub root_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./data/versions"),
        }
    }
}

/// Version snapshot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    /// Concurrent export jobs per snapshot.
    pub worker_count: usize,
    /// Formats snapshotted when a request names none.
    pub default_formats: Vec<String>,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            default_formats: vec![DEFAULT_FORMAT.to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
    /// Enable metrics.
    pub metrics_enabled: bool,
    /// Metrics endpoint path.
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Converts to the logging bootstrap settings. Unknown formats fall back to JSON.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level.to_lowercase(),
            log_format: LogFormat::parse(&self.log_format).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.app.name, "polyglot");
        assert!(config.app.is_development());
        assert_eq!(config.server.public_port, 8000);
        assert_eq!(config.server.private_port, 8001);
        assert_eq!(config.cache.backend, CacheBackend::Filesystem);
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.cache.renewal_threshold(), Duration::from_secs(1800));
        assert_eq!(config.cache.redis.url, "redis://localhost:6379/1");
        assert_eq!(config.versions.worker_count, 4);
        assert_eq!(config.versions.default_formats, vec!["key_value_json"]);
        assert!(config.cache.filesystem.dir.ends_with("polyglot"));
    }

    #[test]
    fn test_server_addresses() {
        let config = ServerConfig::default();
        assert_eq!(config.public_addr(), "0.0.0.0:8000");
        assert_eq!(config.private_addr(), "0.0.0.0:8001");
        assert_eq!(config.grace_period(), Duration::from_secs(10));
    }

    #[test]
    fn test_telemetry_conversion() {
        let observability = ObservabilityConfig {
            log_level: "DEBUG".to_string(),
            log_format: "pretty".to_string(),
            ..Default::default()
        };
        let telemetry = observability.telemetry();
        assert_eq!(telemetry.log_level, "debug");
        assert_eq!(telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_backend_deserializes_lowercase() {
        let backend: CacheBackend = serde_json::from_str("\"redis\"").unwrap();
        assert_eq!(backend, CacheBackend::Redis);
        assert_eq!(backend.to_string(), "redis");
    }
}
