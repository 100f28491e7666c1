// src/content/http.rs
use super::extract::{page_text, post_process, video_summary};
use super::ContentExtractor;
use crate::config::ExtractorConfig;
use anyhow::{Context, Result};
use std::time::Duration;

pub const VIDEO_UNAVAILABLE: &str = "YouTube video - content unavailable";

/// Page content extractor over plain HTTP.
pub struct HttpContentExtractor {
    client: reqwest::Client,
    cfg: ExtractorConfig,
}

impl HttpContentExtractor {
    pub fn new(cfg: ExtractorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("building content http client")?;
        Ok(Self { client, cfg })
    }

    async fn fetch_html(&self, url: &str, timeout: Duration) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }
        resp.text().await.context("reading response body")
    }
}

pub fn is_video_url(url: &str) -> bool {
    url.contains("youtube.com") || url.contains("youtu.be")
}

#[async_trait::async_trait]
impl ContentExtractor for HttpContentExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        if is_video_url(url) {
            let timeout = Duration::from_millis(self.cfg.video_timeout_ms);
            return match self.fetch_html(url, timeout).await {
                Ok(html) => Ok(video_summary(&html)),
                Err(e) => {
                    tracing::debug!(target: "content", error = ?e, %url, "video page unavailable");
                    Ok(VIDEO_UNAVAILABLE.to_string())
                }
            };
        }

        let timeout = Duration::from_millis(self.cfg.timeout_ms);
        let html = self.fetch_html(url, timeout).await?;
        let text = page_text(&html, self.cfg.page_chars);
        Ok(post_process(&text, self.cfg.max_chars))
    }
}
