//! Public and private application routers.

use crate::{
    controllers::{
        cache_controller, health_controller, metrics_controller, project_controller,
        translation_controller, version_controller,
    },
    middleware::logging_middleware,
    openapi::ApiDoc,
    state::AppState,
};
use axum::{http::HeaderValue, middleware, routing::get, Router};
use polyglot_config::{AppConfig, ServerConfig};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Creates the public router that serves translation files.
pub fn create_public_router(state: AppState, server_config: &ServerConfig) -> Router {
    let router = Router::new()
        .merge(translation_controller::router())
        .merge(health_controller::live_router())
        .with_state(state);

    info!("Public router created");
    with_common_layers(router, server_config)
}

/// Creates the private management router.
pub fn create_private_router(state: AppState, config: &AppConfig) -> Router {
    let projects = project_controller::router()
        .merge(version_controller::router())
        .merge(cache_controller::router());

    let mut router = Router::new()
        .merge(health_controller::router())
        .nest("/v1/projects", projects);

    if config.observability.metrics_enabled && state.metrics.is_some() {
        router = router.route(
            &config.observability.metrics_path,
            get(metrics_controller::metrics),
        );
    }

    let router = router
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    info!("Private router created with Swagger UI at /swagger-ui");
    with_common_layers(router, &config.server)
}

/// Request id, tracing, compression, CORS and request logging.
fn with_common_layers(router: Router, server_config: &ServerConfig) -> Router {
    router
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(server_config))
        .layer(middleware::from_fn(logging_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Creates a CORS layer based on server configuration.
fn create_cors_layer(server_config: &ServerConfig) -> CorsLayer {
    if !server_config.cors_enabled {
        return CorsLayer::new();
    }
    if server_config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server_config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
