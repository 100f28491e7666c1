// src/ingest/providers/reading_sites.rs
//! Reading and writing site crawler; only runs for reading/writing interests.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashSet};

use super::PageSource;
use crate::config::CrawlerConfig;
use crate::ingest::{clean_text, infer_subject};
use crate::ingest::types::{RawResource, SourceCrawler};
use crate::taxonomy::taxonomy;

/// A search page; `{q}` is the keyword, `{grade}` the grade slug when supported.
#[derive(Debug, Clone, Copy)]
pub struct ReadingSite {
    pub name: &'static str,
    pub template: &'static str,
    pub grade_param: bool,
}

pub const READING_SITES: &[ReadingSite] = &[
    ReadingSite {
        name: "Reading Rockets",
        template: "https://www.readingrockets.org/search/site/{q}",
        grade_param: false,
    },
    ReadingSite {
        name: "ReadWorks",
        template: "https://www.readworks.org/find-content#{grade}/search?query={q}",
        grade_param: true,
    },
    ReadingSite {
        name: "CommonLit",
        template: "https://www.commonlit.org/en/texts?searchQuery={q}",
        grade_param: false,
    },
    ReadingSite {
        name: "K5 Learning",
        template: "https://www.k5learning.com/search/node/{q}",
        grade_param: false,
    },
];

pub const WRITING_SITES: &[ReadingSite] = &[
    ReadingSite {
        name: "WriteShop",
        template: "https://writeshop.com/?s={q}",
        grade_param: false,
    },
    ReadingSite {
        name: "Brave Writer",
        template: "https://bravewriter.com/search?q={q}",
        grade_param: false,
    },
    ReadingSite {
        name: "Journal Buddies",
        template: "https://www.journalbuddies.com/?s={q}",
        grade_param: false,
    },
];

/// Keywords too broad to search on their own.
const SKIPPED_KEYWORDS: &[&str] = &["reading", "writing", "grade", "school", "homeschool", "education"];

const RETURNED_MAX: usize = 10;

static RESOURCE_LINKS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"a[href*="lesson"], a[href*="resource"], a[href*="activity"], a[href*="worksheet"], a[href*="article"], a[href*="text"]"#,
    )
    .unwrap()
});

pub struct ReadingSiteCrawler {
    pages: PageSource,
    per_site: usize,
    max_total: usize,
}

impl ReadingSiteCrawler {
    pub fn new(pages: PageSource, cfg: &CrawlerConfig) -> Self {
        Self {
            pages,
            per_site: cfg.links_per_site,
            max_total: cfg.max_reading,
        }
    }

    /// First grade label mentioned by any keyword.
    pub fn grade_level(keywords: &[String]) -> Option<String> {
        let tax = taxonomy();
        keywords.iter().find_map(|kw| {
            let kw = kw.to_lowercase();
            tax.grade_labels
                .iter()
                .find(|g| kw.contains(g.as_str()))
                .cloned()
        })
    }

    pub fn site_url(site: &ReadingSite, keyword: &str, grade: Option<&str>) -> String {
        let url = site.template.replace("{q}", &urlencoding::encode(keyword));
        match grade {
            Some(g) if site.grade_param => url.replace("{grade}", &g.replace(' ', "-")),
            _ => url.replace("{grade}/", ""),
        }
    }
}

fn context_description(link: ElementRef<'_>, site: &str) -> String {
    let container = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| matches!(a.value().name(), "div" | "li" | "article"));
    match container {
        Some(c) => {
            let text: String = clean_text(&c.text().collect::<Vec<_>>().join(" "))
                .chars()
                .take(150)
                .collect();
            format!("{text}...")
        }
        None => format!("Resource from {site}"),
    }
}

/// Resource links from one site page: (title, absolute url, description).
pub fn parse_site_page(
    html: &str,
    page_url: &str,
    site: &str,
    limit: usize,
) -> Vec<(String, String, String)> {
    let doc = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    doc.select(&RESOURCE_LINKS)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let url = match &base {
                Some(b) => b.join(href).ok()?.to_string(),
                None => href.to_string(),
            };
            let title = clean_text(&a.text().collect::<String>());
            let title = if title.is_empty() {
                "Educational Resource".to_string()
            } else {
                title
            };
            Some((title, url, context_description(a, site)))
        })
        .take(limit)
        .collect()
}

#[async_trait]
impl SourceCrawler for ReadingSiteCrawler {
    async fn crawl(&self, keywords: &[String]) -> Result<Vec<RawResource>> {
        let grade = Self::grade_level(keywords);
        let has_writing = keywords.iter().any(|k| k.to_lowercase().contains("writ"));
        let extra: &[ReadingSite] = if has_writing { WRITING_SITES } else { &[] };
        let sites: Vec<&ReadingSite> = READING_SITES.iter().chain(extra).collect();
        let default_kind = if has_writing {
            "writing resource"
        } else {
            "reading resource"
        };

        let mut found: Vec<RawResource> = Vec::new();
        let mut attempted = 0usize;
        let mut failed = 0usize;
        'keywords: for keyword in keywords {
            if SKIPPED_KEYWORDS.contains(&keyword.to_lowercase().as_str()) {
                continue;
            }
            for site in &sites {
                let url = Self::site_url(site, keyword, grade.as_deref());
                attempted += 1;
                let body = match self.pages.get(&url).await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider = self.name(), site = site.name, "site fetch failed");
                        failed += 1;
                        continue;
                    }
                };
                for (title, link, description) in
                    parse_site_page(&body, &url, site.name, self.per_site)
                {
                    let lower = format!("{} {}", link.to_lowercase(), title.to_lowercase());
                    let kind = if lower.contains("worksheet") {
                        "worksheet"
                    } else if lower.contains("lesson") {
                        "lesson"
                    } else {
                        default_kind
                    };
                    found.push(RawResource {
                        subject: Some(infer_subject(&link, &title)),
                        kind: Some(kind.to_string()),
                        description: Some(description),
                        title: Some(title),
                        url: Some(link),
                        estimated_time: None,
                    });
                }
                if found.len() >= self.max_total {
                    break 'keywords;
                }
            }
        }

        if attempted > 0 && failed == attempted {
            anyhow::bail!("all {failed} reading site fetches failed");
        }

        let mut seen = HashSet::new();
        Ok(found
            .into_iter()
            .filter(|r| r.url.as_ref().is_some_and(|u| seen.insert(u.clone())))
            .take(RETURNED_MAX)
            .collect())
    }

    fn name(&self) -> &'static str {
        "ReadingSites"
    }

    fn applies_to(&self, interests: &BTreeSet<String>) -> bool {
        interests.contains("reading") || interests.contains("writing")
    }
}
