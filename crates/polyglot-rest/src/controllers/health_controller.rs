//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: String,
    /// Application version.
    pub version: String,
    /// `up` or `down` per dependency.
    pub checks: BTreeMap<String, String>,
}

/// Creates the private health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/live", get(liveness_check))
}

/// Creates the public liveness router.
pub fn live_router() -> Router<AppState> {
    Router::new().route("/live", get(liveness_check))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "A dependency is down", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (cache, storage) = tokio::join!(
        state.translation_service.check_cache(),
        state.version_service.check_storage()
    );

    let mut checks = BTreeMap::new();
    let mut healthy = true;
    for (name, result) in [("cache", cache), ("storage", storage)] {
        let status = match result {
            Ok(()) => "up",
            Err(e) => {
                warn!(check = name, error = %e, "Health check failed");
                healthy = false;
                "down"
            }
        };
        checks.insert(name.to_string(), status.to_string());
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
        }),
    )
}

/// Liveness check endpoint.
#[utoipa::path(
    get,
    path = "/live",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive")
    )
)]
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
