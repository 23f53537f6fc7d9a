//! Server startup utilities.

use polyglot_config::AppConfig;
use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
    ____        __            __      __
   / __ \____  / /_  ______ _/ /___  / /_
  / /_/ / __ \/ / / / / __ `/ / __ \/ __/
 / ____/ /_/ / / /_/ / /_/ / / /_/ / /_
/_/    \____/_/\__, /\__, /_/\____/\__/
              /____//____/
    "#);
}

/// Prints listener and backend information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let private = config.server.private_addr();
    info!("{}", separator);
    info!("Translations: http://{}/v1/project/{{id}}/language/{{code}}", config.server.public_addr());
    info!("Management:   http://{}/v1/projects", private);
    info!("Health:       http://{}/health", private);
    if config.observability.metrics_enabled {
        info!("Metrics:      http://{}{}", private, config.observability.metrics_path);
    }
    info!("API Docs:     http://{}/swagger-ui", private);
    info!("Cache:        {}, ttl {}s", config.cache.backend, config.cache.ttl_secs);
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info(&AppConfig::default());
    }
}
