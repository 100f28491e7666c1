// src/ingest/providers/edu_sites.rs
//! Link crawler over educational site search pages.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use std::collections::HashSet;

use super::{fill_query, PageSource};
use crate::config::CrawlerConfig;
use crate::ingest::types::{RawResource, SourceCrawler};
use crate::ingest::{clean_text, infer_subject, infer_type};

/// Search page templates per subject, selected by keyword cues. `{q}` is the keyword.
const SITE_SEARCHES: &[(&[&str], &[&str])] = &[
    (
        &["art", "draw", "paint", "craft"],
        &[
            "https://www.artforkidshub.com/?s={q}",
            "https://www.deepspacesparkle.com/?s={q}",
            "https://kinderart.com/search-results/?q={q}",
            "https://artfulparent.com/?s={q}",
        ],
    ),
    (
        &["music", "sing", "instrument"],
        &[
            "https://makingmusicfun.net/htm/mmf_music_library/index.php?q={q}",
            "https://www.classicsforkids.com/search?query={q}",
            "https://teachingchildrenmusic.com/?s={q}",
        ],
    ),
    (
        &["read", "book", "literacy"],
        &[
            "https://www.readingrockets.org/search/site/{q}",
            "https://www.readwritethink.org/search?term={q}",
            "https://www.commonlit.org/en/texts?searchQuery={q}",
            "https://www.k5learning.com/search/node/{q}",
        ],
    ),
    (
        &["writ", "journal", "essay"],
        &[
            "https://writeshop.com/?s={q}",
            "https://www.bravewriter.com/search?q={q}",
            "https://www.journalbuddies.com/?s={q}",
        ],
    ),
    (
        &["math", "number", "geometry", "algebra"],
        &[
            "https://www.khanacademy.org/search?page_search_query={q}",
            "https://www.mathplayground.com/search.html?q={q}",
            "https://www.coolmath.com/search?q={q}",
        ],
    ),
    (
        &["science", "biology", "chemistry", "physics"],
        &[
            "https://www.sciencekids.co.nz/search.html?q={q}",
            "https://www.sciencebuddies.org/search?v=oli&s={q}",
            "https://www.exploratorium.edu/search?keyword={q}",
        ],
    ),
    (
        &["history", "geography", "civiliz"],
        &[
            "https://www.historyforkids.net/search.html?searchword={q}",
            "https://www.ducksters.com/search.php?q={q}",
            "https://www.worldhistory.org/search/?q={q}",
        ],
    ),
    (
        &["cod", "program", "computer science"],
        &[
            "https://code.org/search?q={q}",
            "https://scratch.mit.edu/search/projects?q={q}",
            "https://www.tynker.com/search/?q={q}",
        ],
    ),
];

/// Used when no keyword selects a subject table.
const GENERAL_START_PAGES: &[&str] = &[
    "https://www.education.com/resources/",
    "https://www.pbskids.org",
    "https://www.scholastic.com/teachers/teaching-tools/",
];

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static NEXT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a.next, a.nextpostslink, a[rel="next"]"#).unwrap());

pub struct EduSiteCrawler {
    pages: PageSource,
    concurrency: usize,
    max_pages: usize,
}

impl EduSiteCrawler {
    pub fn new(pages: PageSource, cfg: &CrawlerConfig) -> Self {
        Self {
            pages,
            concurrency: cfg.concurrency.max(1),
            max_pages: cfg.max_pages.max(1),
        }
    }

    /// Search urls for the keywords, first occurrence order, no repeats.
    pub fn start_urls(keywords: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for kw in keywords {
            let kw_lower = kw.to_lowercase();
            for (cues, templates) in SITE_SEARCHES {
                if !cues.iter().any(|c| kw_lower.contains(c)) {
                    continue;
                }
                for t in *templates {
                    let url = fill_query(t, kw);
                    if seen.insert(url.clone()) {
                        out.push(url);
                    }
                }
            }
        }
        if out.is_empty() {
            out = GENERAL_START_PAGES.iter().map(|s| s.to_string()).collect();
        }
        out
    }

    /// Crawl one start page and up to `max_pages - 1` "next" pages after it.
    async fn crawl_site(&self, start: String, keywords: &[String]) -> Result<Vec<RawResource>> {
        let mut out = Vec::new();
        let mut url = start;
        for _ in 0..self.max_pages {
            let body = self.pages.get(&url).await?;
            let (records, next) = parse_listing(&body, &url, keywords);
            out.extend(records);
            match next {
                Some(n) if n != url => url = n,
                _ => break,
            }
        }
        Ok(out)
    }
}

/// Keyword-matching links from one listing page, plus the next page url if any.
pub fn parse_listing(html: &str, page_url: &str, keywords: &[String]) -> (Vec<RawResource>, Option<String>) {
    let doc = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let resolve = |href: &str| -> Option<String> {
        if href.starts_with("http") {
            return Some(href.to_string());
        }
        base.as_ref()?.join(href).ok().map(|u| u.to_string())
    };
    let keywords_lower: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    let mut out = Vec::new();
    for a in doc.select(&ANCHORS) {
        let title = clean_text(&a.text().collect::<String>());
        let Some(href) = a.value().attr("href").map(str::trim) else {
            continue;
        };
        if title.is_empty() || href.is_empty() || href.starts_with('#') {
            continue;
        }
        let title_lower = title.to_lowercase();
        if !keywords_lower.iter().any(|k| title_lower.contains(k.as_str())) {
            continue;
        }
        let Some(url) = resolve(href) else {
            continue;
        };
        out.push(RawResource {
            description: Some(format!("Educational resource: {title}")),
            subject: Some(infer_subject(&url, &title)),
            kind: Some(infer_type(&url, &title).to_string()),
            title: Some(title),
            url: Some(url),
            estimated_time: None,
        });
    }

    let next = doc
        .select(&NEXT_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find_map(resolve);

    (out, next)
}

#[async_trait]
impl SourceCrawler for EduSiteCrawler {
    async fn crawl(&self, keywords: &[String]) -> Result<Vec<RawResource>> {
        let starts = Self::start_urls(keywords);
        let total = starts.len();

        let outcomes: Vec<(String, Result<Vec<RawResource>>)> = stream::iter(starts)
            .map(|url| async move {
                let res = self.crawl_site(url.clone(), keywords).await;
                (url, res)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut out = Vec::new();
        let mut failed = 0usize;
        let mut last_err = None;
        for (url, res) in outcomes {
            match res {
                Ok(records) => out.extend(records),
                Err(e) => {
                    tracing::warn!(error = ?e, provider = self.name(), %url, "site crawl failed");
                    failed += 1;
                    last_err = Some(e);
                }
            }
        }

        // every site failed: surface it so the caller counts a provider error
        match last_err {
            Some(e) if failed == total => Err(e),
            _ => Ok(out),
        }
    }

    fn name(&self) -> &'static str {
        "EduSites"
    }
}
