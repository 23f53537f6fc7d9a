//! Version management controller.

use crate::{
    extractors::{parse_project_id, ValidatedJson},
    responses::{created, no_content, ok, ApiResponse, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use polyglot_service::{CreateVersionRequest, VersionResponse};
use tracing::{debug, info};

/// Creates the version router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/versions", get(list_versions).post(create_version))
        .route("/:id/versions/:version_id", delete(delete_version))
}

/// List the versions of a project, newest first.
#[utoipa::path(
    get,
    path = "/v1/projects/{id}/versions",
    tag = "versions",
    params(("id" = u64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Versions", body = [VersionResponse])
    )
)]
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<VersionResponse>> {
    debug!("List versions request: {}", id);
    let project_id = parse_project_id(&id)?;
    ok(state.version_service.list_versions(project_id).await?)
}

/// Snapshot every language of a project.
#[utoipa::path(
    post,
    path = "/v1/projects/{id}/versions",
    tag = "versions",
    params(("id" = u64, Path, description = "Project id")),
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created", body = VersionResponse),
        (status = 400, description = "Invalid or duplicate name", body = polyglot_core::ErrorResponse),
        (status = 500, description = "Snapshot failed", body = polyglot_core::ErrorResponse)
    )
)]
pub async fn create_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateVersionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VersionResponse>>), AppError> {
    let project_id = parse_project_id(&id)?;
    info!(project_id, name = %request.name, "Create version request");

    let version = state.version_service.create_version(project_id, request).await?;
    Ok(created(version))
}

/// Delete a version.
#[utoipa::path(
    delete,
    path = "/v1/projects/{id}/versions/{version_id}",
    tag = "versions",
    params(
        ("id" = u64, Path, description = "Project id"),
        ("version_id" = String, Path, description = "Version id")
    ),
    responses(
        (status = 204, description = "Version deleted"),
        (status = 404, description = "Version not found", body = polyglot_core::ErrorResponse)
    )
)]
pub async fn delete_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let project_id = parse_project_id(&id)?;
    info!(project_id, version_id = %version_id, "Delete version request");

    state
        .version_service
        .delete_version(project_id, &version_id)
        .await?;
    Ok(no_content())
}
