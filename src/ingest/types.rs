// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One record as produced by a source crawler; any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawResource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "estimatedTime")]
    pub estimated_time: Option<String>,
}

/// Normalized resource. `url` is the identity key for one search.
///
/// Serializes to the external result schema: title, url, description, subject,
/// type, estimatedTime, contentText. The relevance score stays internal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub title: String,
    pub url: String,
    pub description: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "estimatedTime")]
    pub estimated_time: String,
    #[serde(skip)]
    pub relevance_score: Option<u32>,
    #[serde(
        rename = "contentText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_text: Option<String>,
}

/// Producer of raw resources for a keyword set (static crawl, scripted pages, fixtures).
#[async_trait::async_trait]
pub trait SourceCrawler: Send + Sync {
    async fn crawl(&self, keywords: &[String]) -> Result<Vec<RawResource>>;
    fn name(&self) -> &'static str;

    /// Whether this source should run for the detected interest categories.
    fn applies_to(&self, _interests: &BTreeSet<String>) -> bool {
        true
    }
}
