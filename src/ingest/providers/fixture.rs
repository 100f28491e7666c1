// src/ingest/providers/fixture.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use crate::ingest::types::{RawResource, SourceCrawler};

/// Crawler that replays raw records from a JSON array (tests, offline runs).
#[derive(Debug, Clone, Default)]
pub struct FixtureCrawler {
    records: Vec<RawResource>,
}

impl FixtureCrawler {
    pub fn new(records: Vec<RawResource>) -> Self {
        Self { records }
    }

    pub fn from_fixture_str(s: &str) -> Result<Self> {
        let records: Vec<RawResource> =
            serde_json::from_str(s).context("parsing fixture records (expected a JSON array)")?;
        Ok(Self { records })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::from_fixture_str(&s)
    }
}

#[async_trait]
impl SourceCrawler for FixtureCrawler {
    async fn crawl(&self, _keywords: &[String]) -> Result<Vec<RawResource>> {
        Ok(self.records.clone())
    }

    fn name(&self) -> &'static str {
        "Fixture"
    }
}
