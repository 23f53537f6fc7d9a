//! Configuration validation module.
//!
//! Collects every problem in the loaded configuration so start-up fails once
//! with a complete report instead of one error at a time.

use crate::{AppConfig, CacheBackend};
use polyglot_core::telemetry::LogFormat;
use polyglot_core::ContentMeta;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Public and private listeners share a port.
    PortConflict { public: u16, private: u16 },
    /// Duration value must be positive.
    NonPositiveDuration { name: String },
    /// Renewal threshold is not below the TTL, so every hit would refresh.
    ThresholdNotBelowTtl { threshold: u64, ttl: u64 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Pool or worker size outside the accepted range.
    InvalidSize { name: String, value: usize, minimum: usize, maximum: usize },
    /// Upstream API token is required outside development.
    MissingApiToken,
    /// Snapshot default format is not supported.
    UnknownFormat { value: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
    /// Metrics path must start with '/'.
    InvalidMetricsPath { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::PortConflict { public, private } => {
                write!(
                    f,
                    "Public port ({}) and private port ({}) cannot be the same",
                    public, private
                )
            }
            Self::NonPositiveDuration { name } => {
                write!(f, "'{}' must be positive", name)
            }
            Self::ThresholdNotBelowTtl { threshold, ttl } => {
                write!(
                    f,
                    "Renewal threshold ({}s) must be lower than the cache TTL ({}s)",
                    threshold, ttl
                )
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::InvalidSize {
                name,
                value,
                minimum,
                maximum,
            } => {
                write!(
                    f,
                    "Invalid {}: {} (must be between {} and {})",
                    name, value, minimum, maximum
                )
            }
            Self::MissingApiToken => {
                write!(f, "Upstream API token is required outside development")
            }
            Self::UnknownFormat { value } => {
                write!(f, "Unsupported default snapshot format: '{}'", value)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: json, pretty)", value)
            }
            Self::InvalidMetricsPath { value } => {
                write!(f, "Metrics path '{}' must start with '/'", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum Redis connection pool size.
    const MAX_POOL_SIZE: usize = 1000;
    /// Maximum snapshot workers.
    const MAX_WORKERS: usize = 64;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::new();

        Self::validate_server(&config.server, &mut result);
        Self::validate_cache(&config.cache, &mut result);
        Self::validate_upstream(config, &mut result);
        Self::validate_versions(&config.versions, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_server(config: &crate::ServerConfig, result: &mut ValidationResult) {
        if config.public_port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "public_port".to_string(),
                value: config.public_port,
            });
        }
        if config.private_port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "private_port".to_string(),
                value: config.private_port,
            });
        }

        if config.public_port != 0 && config.public_port == config.private_port {
            result.add_error(ConfigValidationError::PortConflict {
                public: config.public_port,
                private: config.private_port,
            });
        }
    }

    fn validate_cache(config: &crate::CacheConfig, result: &mut ValidationResult) {
        if config.ttl_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveDuration {
                name: "cache.ttl_secs".to_string(),
            });
        } else if config.renewal_threshold_secs >= config.ttl_secs {
            result.add_error(ConfigValidationError::ThresholdNotBelowTtl {
                threshold: config.renewal_threshold_secs,
                ttl: config.ttl_secs,
            });
        }

        if config.backend != CacheBackend::Redis {
            return;
        }

        if !config.redis.url.starts_with("redis://") && !config.redis.url.starts_with("rediss://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }

        if config.redis.pool_size == 0 || config.redis.pool_size > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::InvalidSize {
                name: "cache.redis.pool_size".to_string(),
                value: config.redis.pool_size,
                minimum: 1,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
    }

    fn validate_upstream(config: &AppConfig, result: &mut ValidationResult) {
        let upstream = &config.upstream;

        match Url::parse(&upstream.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "upstream".to_string(),
                message: format!("Unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "upstream".to_string(),
                message: format!("Invalid URL format: {}", e),
            }),
        }

        if upstream.timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveDuration {
                name: "upstream.timeout_secs".to_string(),
            });
        }

        if upstream.api_token.trim().is_empty() && !config.app.is_development() {
            result.add_error(ConfigValidationError::MissingApiToken);
        }
    }

    fn validate_versions(config: &crate::VersionsConfig, result: &mut ValidationResult) {
        if config.worker_count == 0 || config.worker_count > Self::MAX_WORKERS {
            result.add_error(ConfigValidationError::InvalidSize {
                name: "versions.worker_count".to_string(),
                value: config.worker_count,
                minimum: 1,
                maximum: Self::MAX_WORKERS,
            });
        }

        for format in &config.default_formats {
            if !ContentMeta::is_supported(format) {
                result.add_error(ConfigValidationError::UnknownFormat {
                    value: format.clone(),
                });
            }
        }
    }

    fn validate_observability(config: &crate::ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        if LogFormat::parse(&config.log_format).is_none() {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }

        if config.metrics_enabled && !config.metrics_path.starts_with('/') {
            result.add_error(ConfigValidationError::InvalidMetricsPath {
                value: config.metrics_path.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
