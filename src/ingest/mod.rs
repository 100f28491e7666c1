// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{RawResource, Resource, SourceCrawler};
use crate::taxonomy::taxonomy;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::HashSet;

/// Subject used when nothing in the url/title points at a known domain.
pub const FALLBACK_SUBJECT: &str = "Educational";

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_raw_total", "Raw records received from crawlers.");
        describe_counter!(
            "pipeline_dropped_total",
            "Raw records dropped for a missing title or url."
        );
        describe_counter!("pipeline_dedup_total", "Records removed as duplicate urls.");
        describe_counter!("pipeline_gated_total", "Records removed with a zero score.");
        describe_counter!("pipeline_ranked_total", "Records kept after ranking.");
        describe_counter!("provider_errors_total", "Crawler fetch/parse errors.");
        describe_counter!(
            "content_fetch_failures_total",
            "Content extraction tasks that failed."
        );
        describe_counter!("searches_total", "Finished searches by outcome.");
        describe_histogram!("content_fetch_ms", "Content extraction time in milliseconds.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last finished."
        );
    });
}

/// Clean crawler text: decode entities, strip tags, collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, "");
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// Resource type from url/title cues, in fixed priority order.
pub fn infer_type(url: &str, title: &str) -> &'static str {
    const RULES: &[(&str, &[&str])] = &[
        ("video", &["video", "youtube.com", "youtu.be", "vimeo.com"]),
        ("worksheet", &["worksheet", ".pdf", "printable"]),
        ("interactive", &["interactive", "game", "play"]),
        ("lesson", &["lesson", "curriculum", "tutorial"]),
        ("activity", &["activity", "project", "experiment"]),
    ];
    let url = url.to_lowercase();
    let title = title.to_lowercase();
    RULES
        .iter()
        .find(|(_, cues)| cues.iter().any(|c| url.contains(c) || title.contains(c)))
        .map(|(kind, _)| *kind)
        .unwrap_or("resource")
}

/// Subject from url/title cues (taxonomy order), falling back to "Educational".
pub fn infer_subject(url: &str, title: &str) -> String {
    taxonomy()
        .infer_subject(&[url, title])
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_SUBJECT.to_string())
}

/// Estimated completion time for a resource of `kind`.
///
/// Videos look for a "(M:SS)" / "(H:MM:SS)" token in the title, then the
/// description, then an "N min(ute)(s)" token; other kinds use fixed defaults.
pub fn estimate_duration(kind: &str, title: &str, description: &str) -> String {
    static RE_CLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+:)?\d+:\d+\)").unwrap());
    static RE_MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*min(ute)?s?").unwrap());

    let kind = kind.to_lowercase();
    if kind.contains("video") {
        let title = title.to_lowercase();
        let description = description.to_lowercase();

        let clock = RE_CLOCK
            .find(&title)
            .or_else(|| RE_CLOCK.find(&description));
        if let Some(m) = clock {
            return m.as_str().trim_matches(|c| c == '(' || c == ')').to_string();
        }

        let minutes = RE_MINUTES
            .captures(&title)
            .or_else(|| RE_MINUTES.captures(&description));
        if let Some(n) = minutes.and_then(|c| c.get(1)) {
            return format!("{} minutes", n.as_str());
        }
        return "10 minutes".to_string();
    }
    if kind.contains("worksheet") {
        return "15 minutes".to_string();
    }
    if kind.contains("interactive") || kind.contains("game") {
        return "10 minutes".to_string();
    }
    "5 minutes".to_string()
}

fn non_empty(v: Option<&str>) -> Option<String> {
    v.map(clean_text).filter(|s| !s.is_empty())
}

/// Normalize one raw record. Returns `None` (drop) when title or url is missing.
pub fn normalize_resource(raw: &RawResource) -> Option<Resource> {
    let title = non_empty(raw.title.as_deref())?;
    let url = raw
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())?
        .to_string();

    let subject = non_empty(raw.subject.as_deref()).unwrap_or_else(|| infer_subject(&url, &title));
    let kind = non_empty(raw.kind.as_deref()).unwrap_or_else(|| infer_type(&url, &title).to_string());
    let description = non_empty(raw.description.as_deref())
        .unwrap_or_else(|| format!("Educational resource about {subject}"));
    let estimated_time = non_empty(raw.estimated_time.as_deref())
        .unwrap_or_else(|| estimate_duration(&kind, &title, &description));

    Some(Resource {
        title,
        url,
        description,
        subject,
        kind,
        estimated_time,
        relevance_score: None,
        content_text: None,
    })
}

/// Keep the first resource per url, preserving input order.
pub fn dedup_by_url(resources: Vec<Resource>) -> Vec<Resource> {
    let mut seen: HashSet<String> = HashSet::with_capacity(resources.len());
    resources
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

/// Normalize + dedup. Returns (kept, dropped_invalid, dropped_duplicates).
pub fn normalize_and_dedup(raw: Vec<RawResource>) -> (Vec<Resource>, usize, usize) {
    let total = raw.len();
    let normalized: Vec<Resource> = raw.iter().filter_map(normalize_resource).collect();
    let dropped = total - normalized.len();

    let before = normalized.len();
    let kept = dedup_by_url(normalized);
    let dedup = before - kept.len();

    (kept, dropped, dedup)
}

/// Run one crawler; a failing source contributes zero records.
pub async fn run_crawler(crawler: &dyn SourceCrawler, keywords: &[String]) -> Vec<RawResource> {
    ensure_metrics_described();
    match crawler.crawl(keywords).await {
        Ok(records) => {
            counter!("pipeline_raw_total").increment(records.len() as u64);
            tracing::info!(
                target: "ingest",
                provider = crawler.name(),
                records = records.len(),
                "crawler finished"
            );
            records
        }
        Err(e) => {
            tracing::warn!(error = ?e, provider = crawler.name(), "provider error");
            counter!("provider_errors_total").increment(1);
            Vec::new()
        }
    }
}
