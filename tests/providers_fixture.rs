// tests/providers_fixture.rs
// Crawlers against canned pages served by PageSource::fixtures.

use lesson_scout::config::CrawlerConfig;
use lesson_scout::ingest::normalize_resource;
use lesson_scout::ingest::providers::reading_sites::READING_SITES;
use lesson_scout::ingest::providers::{
    EduSiteCrawler, FixtureCrawler, PageSource, ReadingSiteCrawler, VideoSearchCrawler,
};
use lesson_scout::ingest::types::{RawResource, SourceCrawler};
use lesson_scout::relevance::{score_resource, KeywordProfile};
use lesson_scout::taxonomy::taxonomy;

fn kw(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn edu_sites_follow_next_page_and_skip_missing_sites() {
    let pages = PageSource::fixtures([
        (
            "https://www.artforkidshub.com/?s=painting",
            include_str!("fixtures/edu_listing_p1.html"),
        ),
        (
            "https://www.artforkidshub.com/page/2/?s=painting",
            include_str!("fixtures/edu_listing_p2.html"),
        ),
    ]);
    let crawler = EduSiteCrawler::new(pages, &CrawlerConfig::default());

    let records = crawler.crawl(&kw(&["painting"])).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].url.as_deref(),
        Some("https://www.artforkidshub.com/how-to-draw-painting-trees/")
    );
    assert_eq!(records[0].kind.as_deref(), Some("lesson"));
    assert_eq!(records[0].subject.as_deref(), Some("art"));
    assert_eq!(records[1].kind.as_deref(), Some("video"));
}

#[tokio::test]
async fn edu_sites_error_when_every_site_fails() {
    let crawler = EduSiteCrawler::new(
        PageSource::fixtures(Vec::<(String, String)>::new()),
        &CrawlerConfig::default(),
    );
    assert!(crawler.crawl(&kw(&["painting"])).await.is_err());
}

#[tokio::test]
async fn video_search_takes_three_per_keyword() {
    let url = VideoSearchCrawler::search_url(&VideoSearchCrawler::query_for("fractions"));
    let pages = PageSource::fixtures([(url, include_str!("fixtures/video_results.html"))]);
    let crawler = VideoSearchCrawler::new(pages, &CrawlerConfig::default());

    let records = crawler.crawl(&kw(&["fractions"])).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(
        records[0].url.as_deref(),
        Some("https://www.youtube.com/watch?v=f1")
    );
    assert_eq!(
        records[0].description.as_deref(),
        Some("Educational video about fractions: Adding Fractions (5:30) by Math Antics")
    );
    assert!(records.iter().all(|r| r.kind.as_deref() == Some("video")));

    let first = normalize_resource(&records[0]).unwrap();
    assert_eq!(first.estimated_time, "5:30");
}

#[tokio::test]
async fn video_search_fails_when_every_query_fails() {
    let crawler = VideoSearchCrawler::new(
        PageSource::fixtures(Vec::<(String, String)>::new()),
        &CrawlerConfig::default(),
    );
    assert!(crawler.crawl(&kw(&["fractions", "decimals"])).await.is_err());
}

#[tokio::test]
async fn reading_sites_collect_lesson_and_article_links() {
    let keywords = kw(&["reading comprehension"]);
    let url = ReadingSiteCrawler::site_url(&READING_SITES[0], &keywords[0], None);
    let pages = PageSource::fixtures([(url, include_str!("fixtures/reading_page.html"))]);
    let crawler = ReadingSiteCrawler::new(pages, &CrawlerConfig::default());

    assert!(crawler.applies_to(&taxonomy().detect_interests(&keywords)));
    let records = crawler.crawl(&keywords).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].url.as_deref(),
        Some("https://www.readingrockets.org/lesson/story-map")
    );
    assert_eq!(records[0].kind.as_deref(), Some("lesson"));
    assert_eq!(
        records[0].description.as_deref(),
        Some("Story Map Lesson Graphic organizer for plot and setting....")
    );
    assert_eq!(records[1].kind.as_deref(), Some("reading resource"));
}

#[tokio::test]
async fn reading_sites_fail_when_every_fetch_fails() {
    let crawler = ReadingSiteCrawler::new(
        PageSource::fixtures(Vec::<(String, String)>::new()),
        &CrawlerConfig::default(),
    );
    assert!(crawler.crawl(&kw(&["fables"])).await.is_err());
}

#[test]
fn reading_sites_sit_out_other_interests() {
    let crawler = ReadingSiteCrawler::new(
        PageSource::fixtures(Vec::<(String, String)>::new()),
        &CrawlerConfig::default(),
    );
    assert!(!crawler.applies_to(&taxonomy().detect_interests(&["volcano experiments"])));
}

#[tokio::test]
async fn fixture_crawler_replays_file() {
    let crawler = FixtureCrawler::from_path(std::path::Path::new("tests/fixtures/scenario_a.json"))
        .expect("fixture file");
    let records = crawler.crawl(&[]).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].subject, None);

    assert!(FixtureCrawler::from_fixture_str("{\"not\": \"an array\"}").is_err());
}

#[tokio::test]
async fn crawled_subject_matches_normalizer_inference() {
    let pages = PageSource::fixtures([(
        "https://www.education.com/resources/",
        r#"<ul><li><a href="/science/volcano-lab/">Volcano science lab</a></li></ul>"#,
    )]);
    let crawler = EduSiteCrawler::new(pages, &CrawlerConfig::default());
    let records = crawler.crawl(&kw(&["volcano"])).await.unwrap();
    assert_eq!(records.len(), 1);

    let crawled = normalize_resource(&records[0]).unwrap();
    let inferred = normalize_resource(&RawResource {
        subject: None,
        ..records[0].clone()
    })
    .unwrap();
    assert_eq!(crawled.subject, "nature");
    assert_eq!(crawled, inferred);

    let profile = KeywordProfile::new(&["volcano"]);
    assert_eq!(
        score_resource(&crawled, &profile).score,
        score_resource(&inferred, &profile).score
    );
}
