// src/status.rs
//! Search status records and the stores that hold them.

use crate::ingest::types::Resource;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchState {
    Initializing,
    Scraping,
    Processing,
    Success,
    Error,
}

impl SearchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchState::Success | SearchState::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatus {
    pub id: String,
    pub status: SearchState,
    pub message: String,
    pub progress: u8,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Resource>>,
}

impl SearchStatus {
    /// Fresh record: `initializing`, progress 0, started now.
    pub fn new(id: &str, keywords: &[String]) -> Self {
        Self {
            id: id.to_string(),
            status: SearchState::Initializing,
            message: "Starting search...".to_string(),
            progress: 0,
            keywords: keywords.to_vec(),
            start_time: Some(Utc::now()),
            end_time: None,
            results: None,
        }
    }

    fn apply(&mut self, state: SearchState, message: &str, progress: u8) {
        self.status = state;
        self.message = message.to_string();
        self.progress = progress.min(100);
    }

    fn finish(&mut self, results: Vec<Resource>) {
        self.apply(SearchState::Success, "Search completed successfully!", 100);
        self.end_time = Some(Utc::now());
        self.results = Some(results);
    }
}

/// Search ids become file names: ASCII alphanumerics, `-` and `_` only.
pub fn validate_search_id(id: &str) -> Result<()> {
    if id.is_empty() {
        anyhow::bail!("search id is empty");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!("search id {id:?} contains characters other than [A-Za-z0-9_-]");
    }
    Ok(())
}

/// Keyed store of search status records.
///
/// `update` and `complete` return `Ok(false)` when no record exists for the id.
#[async_trait::async_trait]
pub trait StatusStore: Send + Sync {
    /// Create the record unless one already exists. Returns true when created.
    async fn create_if_absent(&self, id: &str, keywords: &[String]) -> Result<bool>;
    async fn update(&self, id: &str, state: SearchState, message: &str, progress: u8)
        -> Result<bool>;
    /// Terminal success write: results, end time, progress 100.
    async fn complete(&self, id: &str, results: Vec<Resource>) -> Result<bool>;
    async fn get(&self, id: &str) -> Result<Option<SearchStatus>>;
}

/// One pretty-printed JSON file per search: `<dir>/<id>.json`.
pub struct FileStatusStore {
    dir: PathBuf,
}

impl FileStatusStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_search_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }

    async fn read(&self, path: &Path) -> Result<Option<SearchStatus>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let status = serde_json::from_slice(&bytes)
                    .with_context(|| format!("parsing status file {}", path.display()))?;
                Ok(Some(status))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("reading status file {}", path.display()))
            }
        }
    }

    async fn write(&self, path: &Path, status: &SearchStatus) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating status dir {}", self.dir.display()))?;
        let body = serde_json::to_vec_pretty(status)?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("writing status file {}", path.display()))
    }

    async fn modify(&self, id: &str, f: impl FnOnce(&mut SearchStatus) + Send) -> Result<bool> {
        let path = self.path_for(id)?;
        let Some(mut status) = self.read(&path).await? else {
            return Ok(false);
        };
        f(&mut status);
        self.write(&path, &status).await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl StatusStore for FileStatusStore {
    async fn create_if_absent(&self, id: &str, keywords: &[String]) -> Result<bool> {
        let path = self.path_for(id)?;
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("checking status file {}", path.display()))?;
        if exists {
            return Ok(false);
        }
        self.write(&path, &SearchStatus::new(id, keywords)).await?;
        Ok(true)
    }

    async fn update(
        &self,
        id: &str,
        state: SearchState,
        message: &str,
        progress: u8,
    ) -> Result<bool> {
        self.modify(id, |s| s.apply(state, message, progress)).await
    }

    async fn complete(&self, id: &str, results: Vec<Resource>) -> Result<bool> {
        self.modify(id, move |s| s.finish(results)).await
    }

    async fn get(&self, id: &str) -> Result<Option<SearchStatus>> {
        let path = self.path_for(id)?;
        self.read(&path).await
    }
}

/// In-process store for the HTTP server and tests.
#[derive(Default)]
pub struct MemoryStatusStore {
    inner: RwLock<HashMap<String, SearchStatus>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut SearchStatus)) -> bool {
        let mut map = self.inner.write().expect("status map poisoned");
        match map.get_mut(id) {
            Some(s) => {
                f(s);
                true
            }
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl StatusStore for MemoryStatusStore {
    async fn create_if_absent(&self, id: &str, keywords: &[String]) -> Result<bool> {
        validate_search_id(id)?;
        let mut map = self.inner.write().expect("status map poisoned");
        if map.contains_key(id) {
            return Ok(false);
        }
        map.insert(id.to_string(), SearchStatus::new(id, keywords));
        Ok(true)
    }

    async fn update(
        &self,
        id: &str,
        state: SearchState,
        message: &str,
        progress: u8,
    ) -> Result<bool> {
        Ok(self.modify(id, |s| s.apply(state, message, progress)))
    }

    async fn complete(&self, id: &str, results: Vec<Resource>) -> Result<bool> {
        Ok(self.modify(id, move |s| s.finish(results)))
    }

    async fn get(&self, id: &str) -> Result<Option<SearchStatus>> {
        let map = self.inner.read().expect("status map poisoned");
        Ok(map.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_file_name_safe() {
        assert!(validate_search_id("abc-123_X").is_ok());
        assert!(validate_search_id("").is_err());
        assert!(validate_search_id("../etc/passwd").is_err());
        assert!(validate_search_id("a b").is_err());
    }

    #[test]
    fn status_serializes_camel_case() {
        let mut s = SearchStatus::new("s1", &["art".to_string()]);
        s.apply(SearchState::Scraping, "go", 120);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["status"], "scraping");
        assert_eq!(v["progress"], 100);
        assert!(v.get("startTime").is_some());
        assert!(v.get("endTime").is_none());
        assert!(v.get("results").is_none());
    }

    #[tokio::test]
    async fn memory_store_update_requires_record() {
        let store = MemoryStatusStore::new();
        assert!(!store
            .update("x", SearchState::Scraping, "m", 20)
            .await
            .unwrap());
        assert!(store.create_if_absent("x", &[]).await.unwrap());
        assert!(!store.create_if_absent("x", &[]).await.unwrap());
        assert!(store
            .update("x", SearchState::Scraping, "m", 20)
            .await
            .unwrap());
        let s = store.get("x").await.unwrap().unwrap();
        assert_eq!(s.status, SearchState::Scraping);
        assert_eq!(s.progress, 20);
    }
}
