//! Cache purge controller.

use crate::{
    extractors::{parse_language, parse_project_id},
    responses::{no_content, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::delete,
    Router,
};
use tracing::info;

/// Creates the cache router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/cache", delete(purge_project))
        .route("/:id/languages/:language/cache", delete(purge_language))
}

/// Drop every cached file of a project.
#[utoipa::path(
    delete,
    path = "/v1/projects/{id}/cache",
    tag = "cache",
    params(("id" = u64, Path, description = "Project id")),
    responses((status = 204, description = "Purged"))
)]
pub async fn purge_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let project_id = parse_project_id(&id)?;
    info!(project_id, "Purge project cache request");

    state.translation_service.purge_project(project_id).await?;
    Ok(no_content())
}

/// Drop every cached file of one project language.
#[utoipa::path(
    delete,
    path = "/v1/projects/{id}/languages/{language}/cache",
    tag = "cache",
    params(
        ("id" = u64, Path, description = "Project id"),
        ("language" = String, Path, description = "Language code")
    ),
    responses((status = 204, description = "Purged"))
)]
pub async fn purge_language(
    State(state): State<AppState>,
    Path((id, language)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let project_id = parse_project_id(&id)?;
    let language = parse_language(&language)?;
    info!(project_id, language, "Purge language cache request");

    state
        .translation_service
        .purge_translation(project_id, language)
        .await?;
    Ok(no_content())
}
