//! In-memory fakes shared by the service tests.

use crate::cache::TranslationCache;
use async_trait::async_trait;
use chrono::Utc;
use polyglot_core::{checksum, CacheItem, CacheKey, PolyglotError, PolyglotResult};
use polyglot_upstream::{
    ExportRequest, ProjectDetails, ProjectLanguage, ProjectSummary, TranslationClient,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Upstream client that counts calls and serves a fixed payload.
pub struct FakeClient {
    payload: Vec<u8>,
    pub exports: AtomicUsize,
    pub downloads: AtomicUsize,
    gate: Option<Semaphore>,
    failing: bool,
    failing_language: Option<String>,
    languages: Vec<ProjectLanguage>,
    projects: Vec<ProjectSummary>,
    last_export: Mutex<Option<ExportRequest>>,
}

impl FakeClient {
    pub fn new(payload: &[u8]) -> Self {
        Self {
            payload: payload.to_vec(),
            exports: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            gate: None,
            failing: false,
            failing_language: None,
            languages: Vec::new(),
            projects: Vec::new(),
            last_export: Mutex::new(None),
        }
    }

    /// Every export fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(b"")
        }
    }

    /// Exports block until [`FakeClient::release`] is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn with_languages(mut self, codes: &[&str]) -> Self {
        self.languages = codes
            .iter()
            .map(|code| ProjectLanguage {
                name: code.to_uppercase(),
                code: (*code).to_string(),
                translations: 10,
                percentage: 100.0,
                updated: None,
            })
            .collect();
        self
    }

    pub fn with_projects(mut self, ids: &[u64]) -> Self {
        self.projects = ids
            .iter()
            .map(|id| ProjectSummary {
                id: *id,
                name: format!("Project {}", id),
                created: Some("2013-06-10T11:08:54+0000".into()),
            })
            .collect();
        self
    }

    /// Exports of `language` fail.
    pub fn failing_for(mut self, language: &str) -> Self {
        self.failing_language = Some(language.to_string());
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub fn last_export(&self) -> Option<ExportRequest> {
        self.last_export.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranslationClient for FakeClient {
    async fn export_project(&self, request: ExportRequest) -> PolyglotResult<String> {
        self.exports.fetch_add(1, Ordering::SeqCst);
        *self.last_export.lock().unwrap() = Some(request.clone());

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        if self.failing || self.failing_language.as_deref() == Some(request.language.as_str()) {
            return Err(PolyglotError::external("poeditor", "export failed"));
        }

        Ok(format!(
            "https://download.example/{}/{}.{}",
            request.project_id, request.language, request.format
        ))
    }

    async fn download(&self, _url: &str) -> PolyglotResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }

    async fn list_project_languages(&self, _project_id: u64) -> PolyglotResult<Vec<ProjectLanguage>> {
        Ok(self.languages.clone())
    }

    async fn list_projects(&self) -> PolyglotResult<Vec<ProjectSummary>> {
        Ok(self.projects.clone())
    }

    async fn view_project(&self, project_id: u64) -> PolyglotResult<ProjectDetails> {
        self.projects
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| ProjectDetails {
                id: p.id,
                name: p.name.clone(),
                description: None,
                reference_language: Some("en".into()),
                terms: 42,
                created: p.created.clone(),
            })
            .ok_or(PolyglotError::PermissionDenied { project_id })
    }
}

/// Cache store kept in a map, with entry ages under test control.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheItem>>,
    ttl: Duration,
    fail_reads: AtomicBool,
    pub purges: AtomicUsize,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            fail_reads: AtomicBool::new(false),
            purges: AtomicUsize::new(0),
        }
    }

    /// Stores an entry created `age` ago.
    pub fn insert_aged(&self, key: &CacheKey, data: &[u8], age: Duration) {
        let item = CacheItem {
            created_at: Utc::now() - chrono::Duration::from_std(age).unwrap(),
            checksum: checksum(data),
            data: data.to_vec(),
        };
        self.entries.lock().unwrap().insert(key.redis_key(), item);
    }

    /// Every read fails with a non-miss error.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslationCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> PolyglotResult<CacheItem> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PolyglotError::cache("connection refused"));
        }
        let entries = self.entries.lock().unwrap();
        match entries.get(&key.redis_key()) {
            Some(item) if item.expires_at(self.ttl) >= Utc::now() => Ok(item.clone()),
            _ => Err(PolyglotError::CacheMiss),
        }
    }

    async fn set(&self, key: &CacheKey, data: &[u8]) -> PolyglotResult<String> {
        let item = CacheItem::new(data.to_vec());
        let sum = item.checksum.clone();
        self.entries.lock().unwrap().insert(key.redis_key(), item);
        Ok(sum)
    }

    async fn purge(&self, project_id: u64, language: Option<&str>) -> PolyglotResult<()> {
        self.purges.fetch_add(1, Ordering::SeqCst);
        let prefix = match language {
            Some(language) => format!("{}:{}:", project_id, language),
            None => format!("{}:", project_id),
        };
        self.entries
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn ping(&self) -> PolyglotResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
