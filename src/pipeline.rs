// src/pipeline.rs
//! Pipeline coordinator: crawl → normalize → dedup → score/gate → rank → augment,
//! with progress written to the status store between stages.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{PipelineConfig, ScoutConfig};
use crate::content::{augment, ContentExtractor, HttpContentExtractor};
use crate::ingest::providers::{EduSiteCrawler, PageSource, ReadingSiteCrawler, VideoSearchCrawler};
use crate::ingest::types::{RawResource, Resource, SourceCrawler};
use crate::ingest::{ensure_metrics_described, normalize_and_dedup, run_crawler};
use crate::rank::{rank, score_and_gate};
use crate::relevance::KeywordProfile;
use crate::status::{validate_search_id, SearchState, StatusStore};
use crate::taxonomy::taxonomy;

pub const NO_KEYWORDS_MESSAGE: &str = "No search keywords provided";
const ERROR_DETAIL_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub result_cap: usize,
    pub batch_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        (&PipelineConfig::default()).into()
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(c: &PipelineConfig) -> Self {
        Self {
            result_cap: c.result_cap.max(1),
            batch_size: c.batch_size.max(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStats {
    pub total_keywords: usize,
    pub keywords_searched: usize,
    pub resources_found: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub resources: Vec<Resource>,
    pub keyword_stats: KeywordStats,
}

/// Trim, drop empties, and drop exact repeats (first occurrence wins).
pub fn clean_keywords<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for k in raw {
        let k = k.as_ref().trim();
        if !k.is_empty() && !out.iter().any(|seen| seen == k) {
            out.push(k.to_string());
        }
    }
    out
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn error_message(e: &anyhow::Error) -> String {
    let detail: String = format!("{e:#}").chars().take(ERROR_DETAIL_CHARS).collect();
    format!("An error occurred: {detail}")
}

pub struct Pipeline {
    crawlers: Vec<Arc<dyn SourceCrawler>>,
    extractor: Arc<dyn ContentExtractor>,
    store: Arc<dyn StatusStore>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        crawlers: Vec<Arc<dyn SourceCrawler>>,
        extractor: Arc<dyn ContentExtractor>,
        store: Arc<dyn StatusStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            crawlers,
            extractor,
            store,
            settings,
        }
    }

    /// Production wiring: live site crawlers and the HTTP content extractor.
    pub fn with_http_sources(cfg: &ScoutConfig, store: Arc<dyn StatusStore>) -> Result<Self> {
        let crawlers: Vec<Arc<dyn SourceCrawler>> = vec![
            Arc::new(EduSiteCrawler::new(PageSource::http(&cfg.crawler)?, &cfg.crawler)),
            Arc::new(VideoSearchCrawler::new(PageSource::http(&cfg.crawler)?, &cfg.crawler)),
            Arc::new(ReadingSiteCrawler::new(PageSource::http(&cfg.crawler)?, &cfg.crawler)),
        ];
        let extractor = Arc::new(HttpContentExtractor::new(cfg.extractor.clone())?);
        Ok(Self::new(crawlers, extractor, store, (&cfg.pipeline).into()))
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Run one search to a terminal status.
    ///
    /// Empty keywords (after cleaning) end in `error` status with an empty outcome
    /// and no crawling. Any other failure writes `error` status and is returned.
    pub async fn run<S: AsRef<str> + Sync>(&self, id: &str, keywords: &[S]) -> Result<SearchOutcome> {
        ensure_metrics_described();
        validate_search_id(id)?;

        let given: Vec<String> = keywords.iter().map(|k| k.as_ref().to_string()).collect();
        self.store.create_if_absent(id, &given).await?;
        self.progress(
            id,
            SearchState::Initializing,
            "Starting search for educational resources based on profile interests...",
            10,
        )
        .await;

        let cleaned = clean_keywords(&given);
        if cleaned.is_empty() {
            warn!(target: "pipeline", search_id = id, "no usable keywords");
            self.progress(id, SearchState::Error, NO_KEYWORDS_MESSAGE, 0).await;
            counter!("searches_total", "outcome" => "no_keywords").increment(1);
            return Ok(SearchOutcome::default());
        }

        match self.execute(id, &cleaned).await {
            Ok(outcome) => {
                counter!("searches_total", "outcome" => "success").increment(1);
                Ok(outcome)
            }
            Err(e) => {
                warn!(target: "pipeline", search_id = id, error = ?e, "search failed");
                self.progress(id, SearchState::Error, &error_message(&e), 0).await;
                counter!("searches_total", "outcome" => "error").increment(1);
                Err(e)
            }
        }
    }

    async fn execute(&self, id: &str, keywords: &[String]) -> Result<SearchOutcome> {
        let interests = taxonomy().detect_interests(keywords);
        info!(target: "pipeline", search_id = id, keywords = keywords.len(), ?interests, "search started");

        self.progress(
            id,
            SearchState::Scraping,
            "Searching educational websites for personalized content...",
            20,
        )
        .await;

        let active: Vec<Arc<dyn SourceCrawler>> = self
            .crawlers
            .iter()
            .filter(|c| c.applies_to(&interests))
            .cloned()
            .collect();

        let mut raw: Vec<RawResource> = Vec::new();
        for (i, crawler) in active.iter().enumerate() {
            raw.extend(run_crawler(&**crawler, keywords).await);
            let step = 20 + (40 * (i + 1) / active.len()) as u8;
            self.progress(
                id,
                SearchState::Scraping,
                &format!("Collected resources from {}...", crawler.name()),
                step,
            )
            .await;
        }

        self.progress(
            id,
            SearchState::Processing,
            "Processing and filtering results based on your interests...",
            70,
        )
        .await;

        let raw_count = raw.len();
        let (unique, dropped, dedup) = normalize_and_dedup(raw);
        counter!("pipeline_dropped_total").increment(dropped as u64);
        counter!("pipeline_dedup_total").increment(dedup as u64);

        let profile = KeywordProfile::new(keywords);
        let (scored, gated) = score_and_gate(unique, &profile);
        counter!("pipeline_gated_total").increment(gated as u64);

        let ranked = rank(scored, self.settings.result_cap);
        counter!("pipeline_ranked_total").increment(ranked.len() as u64);

        self.progress(
            id,
            SearchState::Processing,
            "Extracting content from resources...",
            80,
        )
        .await;
        let resources = augment(ranked, &*self.extractor, self.settings.batch_size).await;

        self.progress(
            id,
            SearchState::Processing,
            "Finalizing your personalized educational resources...",
            90,
        )
        .await;

        if !self.store.complete(id, resources.clone()).await? {
            anyhow::bail!("status record for search {id} is missing");
        }
        gauge!("pipeline_last_run_ts").set(now_unix() as f64);

        info!(
            target: "pipeline",
            search_id = id,
            raw = raw_count,
            dropped,
            dedup,
            gated,
            kept = resources.len(),
            "search finished"
        );

        Ok(SearchOutcome {
            keyword_stats: KeywordStats {
                total_keywords: keywords.len(),
                keywords_searched: if active.is_empty() { 0 } else { keywords.len() },
                resources_found: resources.len(),
            },
            resources,
        })
    }

    /// Progress writes never change control flow; failures are only logged.
    async fn progress(&self, id: &str, state: SearchState, message: &str, progress: u8) {
        match self.store.update(id, state, message, progress).await {
            Ok(true) => {}
            Ok(false) => warn!(target: "pipeline", search_id = id, "status record missing"),
            Err(e) => warn!(target: "pipeline", search_id = id, error = ?e, "status update failed"),
        }
    }
}
