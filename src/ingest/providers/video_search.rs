// src/ingest/providers/video_search.rs
//! Video search crawler: reads the initial-data JSON embedded in the results page.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::PageSource;
use crate::config::CrawlerConfig;
use crate::ingest::infer_subject;
use crate::ingest::types::{RawResource, SourceCrawler};

const SEARCH_URL: &str = "https://www.youtube.com/results";
// "videos only" result filter
const VIDEO_FILTER: &str = "EgIQAQ%253D%253D";

/// Query suffix chosen by keyword cue, first match wins.
const QUERY_FLAVOURS: &[(&[&str], &str)] = &[
    (&["art", "draw", "craft"], "art tutorial for kids"),
    (&["music", "instrument"], "music lesson"),
    (&["read", "book"], "reading activity"),
    (&["write", "journal"], "writing exercise"),
    (&["math", "number"], "math tutorial"),
    (&["science", "experiment"], "science experiment for kids"),
    (&["history", "geography"], "history lesson"),
    (&["cod", "program"], "coding tutorial for beginners"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHit {
    pub title: String,
    pub url: String,
    pub channel: String,
}

pub struct VideoSearchCrawler {
    pages: PageSource,
    per_keyword: usize,
    max_total: usize,
}

impl VideoSearchCrawler {
    pub fn new(pages: PageSource, cfg: &CrawlerConfig) -> Self {
        Self {
            pages,
            per_keyword: cfg.videos_per_keyword,
            max_total: cfg.max_videos,
        }
    }

    /// Child-appropriate search query for one keyword.
    pub fn query_for(keyword: &str) -> String {
        let kw_lower = keyword.to_lowercase();
        let flavour = QUERY_FLAVOURS
            .iter()
            .find(|(cues, _)| cues.iter().any(|c| kw_lower.contains(c)))
            .map(|(_, f)| *f)
            .unwrap_or("tutorial");
        let mut q = format!("{keyword} {flavour}");
        if !q.contains("kid") && !q.contains("children") {
            q.push_str(" for students");
        }
        q
    }

    pub fn search_url(query: &str) -> String {
        format!(
            "{SEARCH_URL}?search_query={}&sp={VIDEO_FILTER}",
            urlencoding::encode(query)
        )
    }
}

static INITIAL_DATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)ytInitialData\s*=\s*(\{.*?\});\s*</script>").unwrap());

fn text_of(v: &Value) -> Option<String> {
    if let Some(s) = v.get("simpleText").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    let runs = v.get("runs")?.as_array()?;
    let joined: String = runs
        .iter()
        .filter_map(|r| r.get("text").and_then(Value::as_str))
        .collect();
    (!joined.is_empty()).then_some(joined)
}

fn collect_renderers<'a>(v: &'a Value, out: &mut Vec<&'a Value>) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                if k == "videoRenderer" {
                    out.push(child);
                } else {
                    collect_renderers(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|i| collect_renderers(i, out)),
        _ => {}
    }
}

/// Videos from a results page, in page order.
pub fn parse_results(html: &str) -> Result<Vec<VideoHit>> {
    let json = INITIAL_DATA
        .captures(html)
        .and_then(|c| c.get(1))
        .context("results page has no initial data")?
        .as_str();
    let data: Value = serde_json::from_str(json).context("parsing initial data json")?;

    let mut renderers = Vec::new();
    collect_renderers(&data, &mut renderers);

    Ok(renderers
        .into_iter()
        .filter_map(|r| {
            let id = r.get("videoId")?.as_str()?;
            let title = r.get("title").and_then(text_of)?;
            let channel = r
                .get("ownerText")
                .or_else(|| r.get("longBylineText"))
                .and_then(text_of)
                .unwrap_or_default();
            Some(VideoHit {
                title,
                url: format!("https://www.youtube.com/watch?v={id}"),
                channel,
            })
        })
        .collect())
}

#[async_trait]
impl SourceCrawler for VideoSearchCrawler {
    async fn crawl(&self, keywords: &[String]) -> Result<Vec<RawResource>> {
        let mut out: Vec<RawResource> = Vec::new();
        let mut failures = 0usize;

        for keyword in keywords {
            if out.len() >= self.max_total {
                break;
            }
            let query = Self::query_for(keyword);
            let hits = match self.pages.get(&Self::search_url(&query)).await {
                Ok(body) => parse_results(&body),
                Err(e) => Err(e),
            };
            let hits = match hits {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!(error = ?e, provider = self.name(), %query, "video search failed");
                    failures += 1;
                    continue;
                }
            };

            for hit in hits.into_iter().take(self.per_keyword) {
                if out.len() >= self.max_total {
                    break;
                }
                out.push(RawResource {
                    description: Some(format!(
                        "Educational video about {keyword}: {} by {}",
                        hit.title, hit.channel
                    )),
                    subject: Some(infer_subject(&hit.url, &hit.title)),
                    kind: Some("video".to_string()),
                    title: Some(hit.title),
                    url: Some(hit.url),
                    estimated_time: None,
                });
            }
        }

        if out.is_empty() && failures > 0 && failures == keywords.len() {
            anyhow::bail!("all {failures} video searches failed");
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "VideoSearch"
    }
}
