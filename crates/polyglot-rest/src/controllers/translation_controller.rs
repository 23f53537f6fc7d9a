//! Public translation download endpoint.

use crate::{
    extractors::{parse_language, parse_project_id},
    responses::AppError,
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use polyglot_core::{
    validate_version_name, ContentMeta, PolyglotError, Translation, VersionLabel, DEFAULT_FORMAT,
};
use polyglot_service::TranslationRequest;
use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;

/// Query parameters of a translation download.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TranslationQuery {
    /// Export format, `key_value_json` when absent.
    pub format: Option<String>,
    /// Pinned version name, latest data when absent.
    pub version: Option<String>,
    /// Comma-separated tag filter.
    pub tags: Option<String>,
}

/// Creates the public translation router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/v1/project/:project/language/:language",
        get(get_translation),
    )
}

/// Download one language of a project.
#[utoipa::path(
    get,
    path = "/v1/project/{project}/language/{language}",
    tag = "translations",
    params(
        ("project" = u64, Path, description = "Upstream project id"),
        ("language" = String, Path, description = "Language code"),
        TranslationQuery
    ),
    responses(
        (status = 200, description = "Translation file"),
        (status = 304, description = "Matches If-None-Match"),
        (status = 400, description = "Invalid request", body = polyglot_core::ErrorResponse),
        (status = 404, description = "Unknown language or version", body = polyglot_core::ErrorResponse)
    )
)]
pub async fn get_translation(
    State(state): State<AppState>,
    Path((project, language)): Path<(String, String)>,
    Query(query): Query<TranslationQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let project_id = parse_project_id(&project)?;
    let language = parse_language(&language)?;

    let format = query
        .format
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FORMAT);
    let meta = ContentMeta::for_format(format)?;

    let version = VersionLabel::parse(query.version.as_deref());
    if let VersionLabel::Pinned(name) = &version {
        validate_version_name(name)?;
    }
    let tags: Vec<String> = query
        .tags
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if !tags.is_empty() && !version.is_latest() {
        return Err(PolyglotError::validation("Tags cannot be combined with a pinned version").into());
    }

    debug!(project_id, language, format, version = %version, "Translation request");

    let translation = state
        .translation_service
        .get_translation(TranslationRequest {
            project_id,
            language: language.to_string(),
            format: meta.format.to_string(),
            version,
            tags,
        })
        .await?;

    Ok(translation_response(&headers, project_id, language, meta, translation))
}

fn translation_response(
    request_headers: &HeaderMap,
    project_id: u64,
    language: &str,
    meta: &ContentMeta,
    translation: Translation,
) -> Response {
    let cache_control = format!("max-age={}", translation.ttl.as_secs());

    if if_none_match(request_headers, &translation.checksum) {
        return (
            StatusCode::NOT_MODIFIED,
            [
                (header::ETAG, translation.checksum),
                (header::CACHE_CONTROL, cache_control),
            ],
        )
            .into_response();
    }

    let disposition = format!("filename={}-{}.{}", project_id, language, meta.extension);
    let mut response = Response::new(Body::from(translation.data));
    let headers = response.headers_mut();
    for (name, value) in [
        (header::ETAG, translation.checksum.as_str()),
        (header::CACHE_CONTROL, cache_control.as_str()),
        (header::CONTENT_TYPE, meta.mime_type),
        (header::CONTENT_DISPOSITION, disposition.as_str()),
    ] {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }
    headers.insert(
        "content-transfer-encoding",
        HeaderValue::from_static("8bit"),
    );
    response
}

/// Returns `true` when `If-None-Match` names `checksum`, raw, quoted, weak
/// or within a list.
fn if_none_match(headers: &HeaderMap, checksum: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|tag| {
            let tag = tag.trim();
            let tag = tag.strip_prefix("W/").unwrap_or(tag);
            tag.trim_matches('"')
        })
        .any(|tag| tag == "*" || tag == checksum)
}
