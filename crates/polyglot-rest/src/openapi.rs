//! OpenAPI documentation of the private API.

use crate::controllers::health_controller::HealthResponse;
use polyglot_core::ErrorResponse;
use polyglot_service::{
    CreateVersionRequest, LanguageResponse, ProjectDetailsResponse, ProjectResponse,
    VersionResponse,
};
use utoipa::OpenApi;

/// OpenAPI documentation for Polyglot.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Polyglot API",
        version = "1.0.0",
        description = "Pull-through cache of POEditor translations",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        // Translation endpoint (public listener)
        crate::controllers::translation_controller::get_translation,
        // Project endpoints
        crate::controllers::project_controller::list_projects,
        crate::controllers::project_controller::get_project,
        crate::controllers::project_controller::list_languages,
        // Version endpoints
        crate::controllers::version_controller::list_versions,
        crate::controllers::version_controller::create_version,
        crate::controllers::version_controller::delete_version,
        // Cache endpoints
        crate::controllers::cache_controller::purge_project,
        crate::controllers::cache_controller::purge_language,
        // Health endpoints
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            CreateVersionRequest,
            VersionResponse,
            ProjectResponse,
            ProjectDetailsResponse,
            LanguageResponse,
        )
    ),
    tags(
        (name = "translations", description = "Translation downloads"),
        (name = "projects", description = "Upstream project catalog"),
        (name = "versions", description = "Pinned version snapshots"),
        (name = "cache", description = "Cache maintenance"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;
