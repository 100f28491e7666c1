// src/ingest/providers/mod.rs
pub mod edu_sites;
pub mod fixture;
pub mod reading_sites;
pub mod video_search;

pub use edu_sites::EduSiteCrawler;
pub use fixture::FixtureCrawler;
pub use reading_sites::ReadingSiteCrawler;
pub use video_search::VideoSearchCrawler;

use crate::config::CrawlerConfig;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Where crawlers get page bodies from.
pub enum PageSource {
    Http(reqwest::Client),
    /// Canned bodies keyed by exact url; unknown urls are an error.
    Fixture(HashMap<String, String>),
}

impl PageSource {
    pub fn http(cfg: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("building crawler http client")?;
        Ok(PageSource::Http(client))
    }

    pub fn fixtures<I, K, V>(pages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        PageSource::Fixture(
            pages
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        match self {
            PageSource::Http(client) => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?;
                let status = resp.status();
                if !status.is_success() {
                    anyhow::bail!("HTTP {} for {}", status, url);
                }
                resp.text().await.context("reading response body")
            }
            PageSource::Fixture(pages) => pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("no fixture page for {url}")),
        }
    }
}

/// Fill `{q}` with the url-encoded keyword.
pub(crate) fn fill_query(template: &str, keyword: &str) -> String {
    template.replace("{q}", &urlencoding::encode(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_encoded() {
        assert_eq!(
            fill_query("https://x.test/?s={q}", "3rd grade & up"),
            "https://x.test/?s=3rd%20grade%20%26%20up"
        );
    }

    #[tokio::test]
    async fn fixture_source_serves_known_urls() {
        let src = PageSource::fixtures([("https://a.test/", "<p>hi</p>")]);
        assert_eq!(src.get("https://a.test/").await.unwrap(), "<p>hi</p>");
        assert!(src.get("https://b.test/").await.is_err());
    }
}
