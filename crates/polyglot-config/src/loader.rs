//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use polyglot_core::PolyglotError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "POLYGLOT";

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `POLYGLOT_` prefix and `__` separator
    pub fn new(config_dir: impl Into<String>) -> Result<Self, PolyglotError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from `$POLYGLOT_CONFIG_DIR`, or `./config` when unset.
    pub fn from_default_location() -> Result<Self, PolyglotError> {
        let dir = std::env::var(format!("{}_CONFIG_DIR", ENV_PREFIX))
            .unwrap_or_else(|_| "./config".to_string());
        Self::new(dir)
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), PolyglotError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, PolyglotError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment_var = std::env::var(format!("{}_ENVIRONMENT", ENV_PREFIX)).ok();
        let environment = environment_var
            .clone()
            .unwrap_or_else(|| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        let default_path = format!("{}/default.toml", config_dir);
        if Path::new(&default_path).exists() {
            debug!("Loading default config from: {}", default_path);
            builder = builder.add_source(File::with_name(&default_path).required(false));
        }

        let env_path = format!("{}/{}.toml", config_dir, environment);
        if Path::new(&env_path).exists() {
            debug!("Loading environment config from: {}", env_path);
            builder = builder.add_source(File::with_name(&env_path).required(false));
        }

        // Not committed to version control
        let local_path = format!("{}/local.toml", config_dir);
        if Path::new(&local_path).exists() {
            debug!("Loading local config from: {}", local_path);
            builder = builder.add_source(File::with_name(&local_path).required(false));
        }

        if let Some(environment) = environment_var {
            builder = builder
                .set_override("app.environment", environment)
                .map_err(config_error_to_polyglot_error)?;
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.cors_origins")
                .with_list_parse_key("versions.default_formats")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_polyglot_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_polyglot_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration, reporting every problem at once.
    fn validate_config(config: &AppConfig) -> Result<(), PolyglotError> {
        ConfigValidator::validate(config)
            .map_err(|errors| PolyglotError::Configuration(format_validation_errors(&errors)))
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_polyglot_error(err: ConfigError) -> PolyglotError {
    PolyglotError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheBackend;
    use std::fs;

    #[tokio::test]
    async fn test_loads_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.server.public_port, 8000);
        assert_eq!(config.cache.backend, CacheBackend::Filesystem);
    }

    #[tokio::test]
    async fn test_local_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[cache]\nttl_secs = 600\nrenewal_threshold_secs = 60\n\n[server]\npublic_port = 9000\n",
        )
        .unwrap();
        fs::write(dir.path().join("local.toml"), "[server]\npublic_port = 9100\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.cache.renewal_threshold_secs, 60);
        assert_eq!(config.server.public_port, 9100);
        assert_eq!(config.server.private_port, 8001);

        assert_eq!(loader.get_value::<u64>("cache.ttl_secs").await, Some(600));
        assert_eq!(loader.get_value::<u64>("cache.missing").await, None);
    }

    #[tokio::test]
    async fn test_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[cache]\nttl_secs = 60\nrenewal_threshold_secs = 120\n",
        )
        .unwrap();

        let err = ConfigLoader::new(dir.path().to_string_lossy()).err().unwrap();
        assert!(matches!(err, PolyglotError::Configuration(_)));
        assert!(err.to_string().contains("Renewal threshold"));
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        fs::write(&path, "[versions]\nworker_count = 2\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        assert_eq!(loader.get().await.versions.worker_count, 2);

        fs::write(&path, "[versions]\nworker_count = 8\n").unwrap();
        loader.reload().await.unwrap();
        assert_eq!(loader.get().await.versions.worker_count, 8);
    }
}
