// tests/ingest_normalize.rs
use lesson_scout::ingest::types::RawResource;
use lesson_scout::ingest::{clean_text, estimate_duration, normalize_resource};

fn raw(title: Option<&str>, url: Option<&str>) -> RawResource {
    RawResource {
        title: title.map(String::from),
        url: url.map(String::from),
        ..Default::default()
    }
}

#[test]
fn empty_is_ok() {
    assert_eq!(clean_text(""), "");
}

#[test]
fn strips_html_and_unescapes() {
    let s = "<p>Shapes&nbsp;<b>and</b> &ldquo;patterns&rdquo;</p>";
    assert_eq!(clean_text(s), "Shapes and \u{201c}patterns\u{201d}");
}

#[test]
fn folds_whitespace() {
    assert_eq!(clean_text("A\n\tB   C "), "A B C");
}

#[test]
fn every_field_is_populated_when_title_and_url_exist() {
    let cases = [
        ("Counting to 100", "https://learn.test/count"),
        ("Guitar chords (4:12)", "https://www.youtube.com/watch?v=g1"),
        ("Printable maze", "https://learn.test/maze.pdf"),
        ("Planet quiz game", "https://learn.test/planets"),
    ];
    for (title, url) in cases {
        let r = normalize_resource(&raw(Some(title), Some(url))).expect("kept");
        assert_eq!(r.title, title);
        assert_eq!(r.url, url);
        for field in [&r.description, &r.subject, &r.kind, &r.estimated_time] {
            assert!(!field.is_empty(), "empty field for {title}");
        }
        assert!(r.relevance_score.is_none());
        assert!(r.content_text.is_none());
    }
}

#[test]
fn video_duration_comes_from_title_clock() {
    let r = normalize_resource(&raw(
        Some("Guitar chords (4:12)"),
        Some("https://www.youtube.com/watch?v=g1"),
    ))
    .unwrap();
    assert_eq!(r.kind, "video");
    assert_eq!(r.estimated_time, "4:12");
}

#[test]
fn subject_falls_back_to_educational() {
    let r = normalize_resource(&raw(Some("Random Worksheet"), Some("https://x.test/1"))).unwrap();
    assert_eq!(r.subject, "Educational");
    assert_eq!(r.kind, "worksheet");
    assert_eq!(r.description, "Educational resource about Educational");
}

#[test]
fn records_without_title_or_url_are_dropped() {
    assert!(normalize_resource(&raw(None, Some("https://x.test/1"))).is_none());
    assert!(normalize_resource(&raw(Some("Title"), None)).is_none());
    assert!(normalize_resource(&raw(Some("<br>"), Some("https://x.test/1"))).is_none());
}

#[test]
fn duration_examples() {
    assert_eq!(estimate_duration("video", "Fractions (5:30)", ""), "5:30");
    assert_eq!(
        estimate_duration("video", "Intro to Fractions", "15 minutes of fun"),
        "15 minutes"
    );
    assert_eq!(estimate_duration("worksheet", "", ""), "15 minutes");
    assert_eq!(estimate_duration("resource", "", ""), "5 minutes");
}
