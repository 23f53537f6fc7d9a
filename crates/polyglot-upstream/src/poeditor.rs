//! POEditor v2 API client.
//!
//! Every call is a form-encoded `POST` carrying `api_token`. Responses share
//! one envelope whose `response.code` carries the outcome; HTTP status is 200
//! even for most failures.

use crate::{
    ExportRequest, ProjectDetails, ProjectLanguage, ProjectSummary, TranslationClient,
};
use async_trait::async_trait;
use polyglot_core::{PolyglotError, PolyglotResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Service name used in `ExternalService` errors.
pub const SERVICE_NAME: &str = "poeditor";

const CODE_OK: &str = "200";
const CODE_PERMISSION_DENIED: &str = "403";
const CODE_LANGUAGE_NOT_FOUND: &str = "4044";

/// HTTP client of the POEditor API.
pub struct PoEditorClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl PoEditorClient {
    /// Creates a new client with the given request timeout.
    pub fn new(base_url: &str, api_token: impl Into<String>, timeout: Duration) -> PolyglotResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| PolyglotError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url, api_token))
    }

    /// Creates a client on top of an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str, api_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts a form and unwraps the response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> PolyglotResult<Envelope<T>> {
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        form.push(("api_token", self.api_token.as_str()));
        form.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let response = self
            .client
            .post(self.url(path))
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(path, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PolyglotError::external(
                SERVICE_NAME,
                format!("{} returned HTTP {}: {}", path, status, body),
            ));
        }

        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| PolyglotError::external(SERVICE_NAME, format!("Failed to decode {} response: {}", path, e)))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: ResponseStatus,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ResponseStatus {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl<T> Envelope<T> {
    /// Returns the result for code 200, otherwise the generic upstream error.
    fn into_result(self, path: &str) -> PolyglotResult<T> {
        if self.response.code != CODE_OK {
            return Err(PolyglotError::external(
                SERVICE_NAME,
                format!("{} failed with code {}: {}", path, self.response.code, self.response.message),
            ));
        }
        self.result.ok_or_else(|| {
            PolyglotError::external(SERVICE_NAME, format!("{} returned no result", path))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExportResult {
    url: String,
}

#[derive(Debug, Deserialize)]
struct LanguagesResult {
    #[serde(default)]
    languages: Vec<ProjectLanguage>,
}

#[derive(Debug, Deserialize)]
struct ProjectsResult {
    #[serde(default)]
    projects: Vec<ProjectSummary>,
}

#[derive(Debug, Deserialize)]
struct ProjectResult {
    project: ProjectDetails,
}

/// Encodes a list the way the export endpoint expects it: a JSON array.
fn form_array(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn transport_error(path: &str, err: &reqwest::Error) -> PolyglotError {
    let kind = if err.is_timeout() { "timed out" } else { "failed" };
    PolyglotError::external(SERVICE_NAME, format!("Request to {} {}: {}", path, kind, err))
}

#[async_trait]
impl TranslationClient for PoEditorClient {
    async fn export_project(&self, request: ExportRequest) -> PolyglotResult<String> {
        debug!(
            project_id = request.project_id,
            language = %request.language,
            format = %request.format,
            "Requesting upstream export"
        );

        let path = "/v2/projects/export";
        let envelope: Envelope<ExportResult> = self
            .call(
                path,
                &[
                    ("id", request.project_id.to_string()),
                    ("language", request.language.clone()),
                    ("type", request.format.clone()),
                    ("filters", form_array(&request.filters)),
                    ("tags", form_array(&request.tags)),
                ],
            )
            .await?;

        let code = envelope.response.code.clone();
        match code.as_str() {
            CODE_PERMISSION_DENIED => Err(PolyglotError::PermissionDenied {
                project_id: request.project_id,
            }),
            CODE_LANGUAGE_NOT_FOUND => Err(PolyglotError::LanguageNotFound {
                project_id: request.project_id,
                language_code: request.language,
            }),
            _ => envelope.into_result(path).map(|result| result.url),
        }
    }

    async fn download(&self, url: &str) -> PolyglotResult<Vec<u8>> {
        debug!("Downloading export from upstream");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error("download", &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PolyglotError::external(
                SERVICE_NAME,
                format!("Download returned HTTP {}", status),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("download", &e))?;

        Ok(bytes.to_vec())
    }

    async fn list_project_languages(&self, project_id: u64) -> PolyglotResult<Vec<ProjectLanguage>> {
        debug!(project_id, "Listing upstream project languages");

        let path = "/v2/languages/list";
        let envelope: Envelope<LanguagesResult> =
            self.call(path, &[("id", project_id.to_string())]).await?;

        if envelope.response.code == CODE_PERMISSION_DENIED {
            return Err(PolyglotError::PermissionDenied { project_id });
        }

        envelope.into_result(path).map(|result| result.languages)
    }

    async fn list_projects(&self) -> PolyglotResult<Vec<ProjectSummary>> {
        debug!("Listing upstream projects");

        let path = "/v2/projects/list";
        let envelope: Envelope<ProjectsResult> = self.call(path, &[]).await?;
        envelope.into_result(path).map(|result| result.projects)
    }

    async fn view_project(&self, project_id: u64) -> PolyglotResult<ProjectDetails> {
        debug!(project_id, "Viewing upstream project");

        let path = "/v2/projects/view";
        let envelope: Envelope<ProjectResult> =
            self.call(path, &[("id", project_id.to_string())]).await?;

        if envelope.response.code == CODE_PERMISSION_DENIED {
            return Err(PolyglotError::PermissionDenied { project_id });
        }

        envelope.into_result(path).map(|result| result.project)
    }
}
