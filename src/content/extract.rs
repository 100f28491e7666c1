// src/content/extract.rs
//! HTML → readable text for the page content extractor.
//!
//! Everything here is synchronous: `scraper::Html` is not `Send`, so documents
//! are parsed and dropped before any await point.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

fn sel(s: &'static str) -> Selector {
    Selector::parse(s).unwrap_or_else(|e| panic!("invalid selector {s}: {e:?}"))
}

static ARTICLE: Lazy<Selector> = Lazy::new(|| sel("article"));
static MAIN: Lazy<Selector> = Lazy::new(|| sel("main"));
static HEADINGS: Lazy<Selector> = Lazy::new(|| sel("h1, h2, h3, h4, h5, h6"));
static LISTS: Lazy<Selector> = Lazy::new(|| sel("ol, ul"));
static LIST_ITEMS: Lazy<Selector> = Lazy::new(|| sel("li"));
static CONTENT_AREAS: Lazy<Selector> = Lazy::new(|| {
    sel(".content, #content, .main-content, #main, .lesson, .resource, .worksheet, .activity, .article")
});
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| sel("p"));
static DEFINITIONS: Lazy<Selector> = Lazy::new(|| sel("dl, .definition, .key-term, .glossary"));

const SKIPPED_HEADINGS: &[&str] = &["menu", "navigation", "search"];

/// Collapse whitespace runs in an element's text.
fn clean(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inside page chrome (nav/header/footer)?
fn in_chrome(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "nav" | "header" | "footer"))
}

fn paragraphs_of(root: ElementRef<'_>, min_chars: usize, skip_chrome: bool) -> Vec<String> {
    root.select(&PARAGRAPHS)
        .filter(|p| !(skip_chrome && in_chrome(*p)))
        .map(clean)
        .filter(|t| t.chars().count() > min_chars)
        .collect()
}

/// Extract article/main text, headings, lists, paragraphs and definitions.
/// Output is capped at `cap_chars` characters.
pub fn page_text(html: &str, cap_chars: usize) -> String {
    let doc = Html::parse_document(html);
    let mut blocks: Vec<String> = Vec::new();

    for article in doc.select(&ARTICLE) {
        blocks.push(clean(article));
    }
    if blocks.is_empty() {
        if let Some(main) = doc.select(&MAIN).next() {
            blocks.push(clean(main));
        }
    }
    blocks.retain(|b| !b.is_empty());

    let headings: Vec<String> = doc
        .select(&HEADINGS)
        .map(clean)
        .filter(|h| h.chars().count() > 3 && !SKIPPED_HEADINGS.contains(&h.to_lowercase().as_str()))
        .map(|h| format!("Heading: {h}"))
        .collect();
    if !headings.is_empty() {
        blocks.push(headings.join("\n"));
    }

    for list in doc.select(&LISTS) {
        let children = list.children().filter_map(ElementRef::wrap).count();
        if children < 2 || in_chrome(list) {
            continue;
        }
        let items: Vec<String> = list
            .select(&LIST_ITEMS)
            .map(clean)
            .filter(|t| !t.is_empty())
            .map(|t| format!("- {t}"))
            .collect();
        if items.is_empty() {
            continue;
        }
        let label = if list.value().name() == "ol" {
            "Ordered List:"
        } else {
            "Unordered List:"
        };
        blocks.push(format!("{label}\n{}", items.join("\n")));
    }

    if blocks.first().map_or(true, |b| b.chars().count() < 200) {
        for area in doc.select(&CONTENT_AREAS) {
            let paras = paragraphs_of(area, 30, false);
            if !paras.is_empty() {
                blocks.push(paras.join("\n\n"));
            }
        }
    }

    let total: usize = blocks.iter().map(|b| b.chars().count()).sum();
    if total < 200 {
        let paras = paragraphs_of(doc.root_element(), 40, true);
        if !paras.is_empty() {
            blocks.push(paras.join("\n\n"));
        }
    }

    let definitions: Vec<String> = doc
        .select(&DEFINITIONS)
        .map(clean)
        .filter(|d| !d.is_empty())
        .collect();
    if !definitions.is_empty() {
        blocks.push(format!("Key Terms and Definitions:\n{}", definitions.join("\n")));
    }

    blocks.join("\n\n").chars().take(cap_chars).collect()
}

fn meta_content(doc: &Html, selector: &'static str) -> Option<String> {
    let s = Selector::parse(selector).ok()?;
    doc.select(&s)
        .filter_map(|m| m.value().attr("content"))
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|c| !c.is_empty())
}

/// Metadata summary for a video watch page (title, channel, description).
pub fn video_summary(html: &str) -> String {
    let doc = Html::parse_document(html);

    let title = meta_content(&doc, r#"meta[name="title"]"#)
        .or_else(|| meta_content(&doc, r#"meta[property="og:title"]"#))
        .or_else(|| {
            let s = Selector::parse("h1, title").ok()?;
            doc.select(&s).map(clean).find(|t| !t.is_empty())
        });
    let channel = meta_content(&doc, r#"link[itemprop="name"]"#)
        .or_else(|| {
            let s = Selector::parse("#owner-name a, #channel-name").ok()?;
            doc.select(&s).map(clean).find(|t| !t.is_empty())
        });
    let description = meta_content(&doc, r#"meta[name="description"]"#)
        .or_else(|| meta_content(&doc, r#"meta[property="og:description"]"#));

    let mut out = String::from("YouTube Video Content:\n\n");
    if let Some(t) = title {
        out.push_str(&format!("Title: {t}\n\n"));
    }
    if let Some(c) = channel {
        out.push_str(&format!("Channel: {c}\n\n"));
    }
    if let Some(d) = description {
        out.push_str(&format!("Description:\n{d}\n\n"));
    }
    out
}

static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_SECTIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(Introduction|Overview|Summary):",
        r"(?i)(Steps|Instructions|Procedure):",
        r"(?i)(Materials|Supplies|Resources):",
        r"(?i)(Conclusion|Results|Outcome):",
        r"(?i)(Assessment|Evaluation|Quiz):",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});
static RE_BULLETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\*(\s)").unwrap());
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"Heading:\s*([^\n]+)").unwrap());

pub const TRUNCATION_MARKER: &str = "...[content truncated]";

/// Tidy extracted text: blank-line runs, section markers, heading markers, length cap.
pub fn post_process(content: &str, max_chars: usize) -> String {
    if content.is_empty() {
        return String::new();
    }
    let mut out = RE_BLANK_RUNS.replace_all(content, "\n\n").into_owned();
    for re in RE_SECTIONS.iter() {
        out = re.replace_all(&out, "\n\n===${1}===\n\n").into_owned();
    }
    out = RE_BULLETS.replace_all(&out, "-${1}").into_owned();
    out = RE_HEADING.replace_all(&out, "=== ${1} ===").into_owned();

    if out.chars().count() > max_chars {
        let mut cut: String = out.chars().take(max_chars).collect();
        cut.push_str(TRUNCATION_MARKER);
        return cut;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESSON: &str = r#"
<html><body>
  <nav><ul><li>Home</li><li>About</li></ul></nav>
  <main>
    <h1>Menu</h1>
    <h2>Mixing   colors</h2>
    <h3>Art</h3>
    <ol><li>Wet the paper</li><li>Add paint</li></ol>
    <ul><li>only one</li></ul>
  </main>
  <dl><dt>Hue</dt><dd>The color itself</dd></dl>
</body></html>"#;

    #[test]
    fn page_text_collects_blocks() {
        let t = page_text(LESSON, 15_000);
        assert!(t.contains("Heading: Mixing colors"));
        assert!(!t.contains("Heading: Menu"));
        assert!(!t.contains("Heading: Art"));
        assert!(t.contains("Ordered List:\n- Wet the paper\n- Add paint"));
        // single-item and navigation lists are skipped
        assert!(!t.contains("- only one"));
        assert!(!t.contains("- Home"));
        assert!(t.contains("Key Terms and Definitions:\nHue The color itself"));
    }

    #[test]
    fn short_pages_fall_back_to_paragraphs() {
        let html = r#"<html><body>
            <header><p>This header paragraph is long enough to count but sits in chrome.</p></header>
            <p>short</p>
            <p>Plants need sunlight, water and air to grow into healthy adults.</p>
        </body></html>"#;
        let t = page_text(html, 15_000);
        assert!(t.contains("Plants need sunlight"));
        assert!(!t.contains("header paragraph"));
        assert!(!t.contains("short"));
    }

    #[test]
    fn page_text_is_capped() {
        let long = format!("<article>{}</article>", "word ".repeat(100));
        assert_eq!(page_text(&long, 20).chars().count(), 20);
    }

    #[test]
    fn video_summary_reads_meta() {
        let html = r#"<html><head>
            <meta name="title" content="Learn Ukulele Chords">
            <meta name="description" content="Three easy   chords.">
            </head><body><span itemprop="author"><link itemprop="name" content="Strum School"></span></body></html>"#;
        let s = video_summary(html);
        assert!(s.starts_with("YouTube Video Content:\n\n"));
        assert!(s.contains("Title: Learn Ukulele Chords\n\n"));
        assert!(s.contains("Channel: Strum School\n\n"));
        assert!(s.contains("Description:\nThree easy chords.\n\n"));
    }

    #[test]
    fn post_process_marks_sections_and_headings() {
        let raw = "Heading: Volcanoes\n\n\n\nMaterials: baking soda\n* vinegar";
        let out = post_process(raw, 20_000);
        assert!(out.contains("=== Volcanoes ==="));
        assert!(out.contains("===Materials==="));
        assert!(out.contains("\n- vinegar"));
        assert!(!out.contains("\n\n\n\n\n\n\n"));
    }

    #[test]
    fn post_process_truncates() {
        let out = post_process(&"a".repeat(50), 10);
        assert_eq!(out, format!("{}{}", "a".repeat(10), TRUNCATION_MARKER));
        assert_eq!(post_process("", 10), "");
    }
}
