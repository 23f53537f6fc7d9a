//! Project catalog controller.

use crate::{
    extractors::parse_project_id,
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use polyglot_service::{LanguageResponse, ProjectDetailsResponse, ProjectResponse};
use tracing::debug;

/// Creates the project router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects))
        .route("/:id", get(get_project))
        .route("/:id/languages", get(list_languages))
}

/// List every project visible to the API token.
#[utoipa::path(
    get,
    path = "/v1/projects",
    tag = "projects",
    responses(
        (status = 200, description = "Projects", body = [ProjectResponse]),
        (status = 500, description = "Upstream failure", body = polyglot_core::ErrorResponse)
    )
)]
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Vec<ProjectResponse>> {
    debug!("List projects request");
    ok(state.project_service.list_projects().await?)
}

/// Get one project.
#[utoipa::path(
    get,
    path = "/v1/projects/{id}",
    tag = "projects",
    params(("id" = u64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = ProjectDetailsResponse),
        (status = 400, description = "Invalid id or no access", body = polyglot_core::ErrorResponse)
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ProjectDetailsResponse> {
    debug!("Get project request: {}", id);
    let project_id = parse_project_id(&id)?;
    ok(state.project_service.get_project(project_id).await?)
}

/// List the languages of a project.
#[utoipa::path(
    get,
    path = "/v1/projects/{id}/languages",
    tag = "projects",
    params(("id" = u64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Languages", body = [LanguageResponse]),
        (status = 400, description = "Invalid id or no access", body = polyglot_core::ErrorResponse)
    )
)]
pub async fn list_languages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<LanguageResponse>> {
    debug!("List languages request: {}", id);
    let project_id = parse_project_id(&id)?;
    ok(state.project_service.list_languages(project_id).await?)
}
