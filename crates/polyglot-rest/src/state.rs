//! Application state for Axum handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use polyglot_service::{ProjectService, TranslationService, VersionService};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub translation_service: Arc<dyn TranslationService>,
    pub version_service: Arc<dyn VersionService>,
    pub project_service: Arc<dyn ProjectService>,
    /// Renders the Prometheus exposition when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        translation_service: Arc<dyn TranslationService>,
        version_service: Arc<dyn VersionService>,
        project_service: Arc<dyn ProjectService>,
    ) -> Self {
        Self {
            translation_service,
            version_service,
            project_service,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
