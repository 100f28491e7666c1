// tests/content_batches.rs
// Batched content augmentation with a scripted extractor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lesson_scout::content::{augment, ContentExtractor};
use lesson_scout::ingest::types::Resource;

fn resource(i: usize) -> Resource {
    Resource {
        title: format!("Resource {i}"),
        url: format!("https://content.test/{i}"),
        description: "d".into(),
        subject: "Educational".into(),
        kind: "resource".into(),
        estimated_time: "5 minutes".into(),
        relevance_score: Some(1),
        content_text: None,
    }
}

/// Fails for one url, panics for another, tracks peak concurrency.
#[derive(Default)]
struct Scripted {
    fail_url: Option<String>,
    panic_url: Option<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl ContentExtractor for Scripted {
    async fn extract(&self, url: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        // later items finish first so completion order differs from input order
        let idx: u64 = url.rsplit('/').next().and_then(|s| s.parse().ok()).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(30 - idx * 2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_url.as_deref() == Some(url) {
            panic!("extractor blew up");
        }
        if self.fail_url.as_deref() == Some(url) {
            anyhow::bail!("navigation timeout");
        }
        Ok(format!("content of {url}"))
    }
}

#[tokio::test]
async fn failing_item_is_isolated_and_order_is_kept() {
    let extractor = Scripted {
        fail_url: Some("https://content.test/1".into()),
        ..Default::default()
    };
    let input: Vec<Resource> = (0..10).map(resource).collect();

    let out = augment(input.clone(), &extractor, 3).await;

    assert_eq!(out.len(), 10);
    for (i, (got, orig)) in out.iter().zip(&input).enumerate() {
        assert_eq!(got.url, orig.url, "order changed at {i}");
        let text = got.content_text.as_deref().expect("content set for every item");
        if i == 1 {
            assert_eq!(text, "");
        } else {
            assert_eq!(text, format!("content of {}", orig.url));
        }
    }
    assert!(extractor.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn panicking_extractor_maps_to_empty_text() {
    let extractor = Scripted {
        panic_url: Some("https://content.test/2".into()),
        ..Default::default()
    };
    let out = augment((0..4).map(resource).collect(), &extractor, 3).await;
    assert_eq!(out[2].content_text.as_deref(), Some(""));
    assert_eq!(out[3].content_text.as_deref(), Some("content of https://content.test/3"));
}

#[tokio::test]
async fn sentinel_urls_are_not_fetched() {
    let extractor = Arc::new(Scripted::default());
    let mut items = vec![resource(0), resource(1)];
    items[0].url = "#".into();
    items[1].url = "file:///tmp/x.html".into();

    let out = augment(items, extractor.as_ref(), 3).await;
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert!(out.iter().all(|r| r.content_text.as_deref() == Some("")));
}

#[tokio::test]
async fn batch_size_one_is_sequential() {
    let extractor = Scripted::default();
    let out = augment((0..5).map(resource).collect(), &extractor, 1).await;
    assert_eq!(out.len(), 5);
    assert_eq!(extractor.peak.load(Ordering::SeqCst), 1);
}
