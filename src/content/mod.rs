// src/content/mod.rs
//! Content augmentation: batched, failure-isolated page content fetches for
//! the ranked resources.

pub mod extract;
pub mod http;

use crate::ingest::ensure_metrics_described;
use crate::ingest::types::Resource;
use futures::FutureExt;
use metrics::{counter, histogram};
use std::panic::AssertUnwindSafe;
use std::time::Instant;

pub use http::HttpContentExtractor;

/// Fetches readable text for a resource url.
///
/// An `Err` is absorbed by the orchestrator and becomes an empty `contentText`.
#[async_trait::async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> anyhow::Result<String>;
}

/// Placeholder urls that are never fetched.
pub fn is_sentinel_url(url: &str) -> bool {
    url == "#" || url.starts_with("file://")
}

/// One task: never fails, never unwinds.
async fn fetch_one(extractor: &dyn ContentExtractor, url: &str) -> String {
    if is_sentinel_url(url) {
        return String::new();
    }
    let started = Instant::now();
    let outcome = AssertUnwindSafe(extractor.extract(url)).catch_unwind().await;
    histogram!("content_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);

    match outcome {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!(target: "content", error = ?e, %url, "content fetch failed");
            counter!("content_fetch_failures_total").increment(1);
            String::new()
        }
        Err(_) => {
            tracing::warn!(target: "content", %url, "content extractor panicked");
            counter!("content_fetch_failures_total").increment(1);
            String::new()
        }
    }
}

/// Populate `content_text` for every resource, `batch_size` fetches at a time.
///
/// A batch is awaited completely before the next one starts. Results are
/// assigned by position, so the output order equals the input order.
pub async fn augment(
    mut resources: Vec<Resource>,
    extractor: &dyn ContentExtractor,
    batch_size: usize,
) -> Vec<Resource> {
    ensure_metrics_described();
    let batch_size = batch_size.max(1);

    for batch in resources.chunks_mut(batch_size) {
        let texts = futures::future::join_all(
            batch.iter().map(|r| fetch_one(extractor, r.url.as_str())),
        )
        .await;
        for (res, text) in batch.iter_mut().zip(texts) {
            res.content_text = Some(text);
        }
    }

    resources
}
