//! # Polyglot Server
//!
//! Pull-through cache in front of the POEditor API. The public listener
//! serves translation files, the private one carries health, metrics and
//! the management API.

use polyglot_config::ConfigLoader;
use polyglot_core::{telemetry::init_tracing, PolyglotResult};
use polyglot_server::{install_metrics, startup, Application};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // The subscriber may not be installed yet when configuration fails.
        eprintln!("Application error: {}", e);
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> PolyglotResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    init_tracing(&config.observability.telemetry())?;
    startup::print_banner();

    info!("Starting Polyglot...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    let metrics = if config.observability.metrics_enabled {
        Some(install_metrics()?)
    } else {
        None
    };

    let app = Application::build(&config, metrics).await?;
    startup::print_startup_info(&config);

    app.run().await
}
