// src/relevance.rs
//! Relevance scoring: keyword classification, the taxonomy-driven scoring loop,
//! and anonymized dev logging of score explanations.

use crate::ingest::types::Resource;
use crate::taxonomy::{taxonomy, Taxonomy};
use tracing::info;

// Dev logging gate: SCOUT_DEV_LOG=1 AND dev env (debug or SCOUT_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("SCOUT_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SCOUT_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Minimal, anonymized dev logger for scoring events.
fn dev_log_relevance(url: &str, rel: &Relevance) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(url);
    let matched_short = truncate_vec(&rel.matched, 5);
    let reasons_short = truncate_vec(&rel.reasons, 5);
    // Never log raw text. Only hashed id + short lists.
    info!(
        target: "relevance",
        %id, score = rel.score,
        matched = ?matched_short,
        reasons = ?reasons_short
    );
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/// Result of relevance evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relevance {
    pub score: u32,
    /// Keywords and domain terms found in the text.
    pub matched: Vec<String>,
    pub reasons: Vec<String>,
}

/// Keywords of one search, classified once and reused for every resource.
#[derive(Debug, Clone)]
pub struct KeywordProfile {
    /// Every keyword, lower-cased, in input order.
    keywords: Vec<String>,
    /// Specific keywords; may repeat a keyword (topic-term double counting).
    specific: Vec<String>,
    /// Per taxonomy domain (same index), the keywords related to it.
    related: Vec<Vec<String>>,
}

impl KeywordProfile {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self::with_taxonomy(keywords, taxonomy())
    }

    pub fn with_taxonomy<S: AsRef<str>>(keywords: &[S], tax: &Taxonomy) -> Self {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let mut specific = Vec::new();
        let mut related = vec![Vec::new(); tax.domains.len()];

        for kw in &keywords {
            if is_specific(kw, tax) {
                specific.push(kw.clone());
            }
            for (i, domain) in tax.domains.iter().enumerate() {
                if !domain.relates_to(kw) {
                    continue;
                }
                related[i].push(kw.clone());
                for term in domain.topic_terms() {
                    if kw.contains(term.as_str()) {
                        specific.push(kw.clone());
                    }
                }
            }
        }

        Self {
            keywords,
            specific,
            related,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn specific(&self) -> &[String] {
        &self.specific
    }
}

/// A keyword is generic when it is at most two words and one of its words is a
/// main subject, or it contains a grade label.
fn is_generic(kw_lower: &str, tax: &Taxonomy) -> bool {
    let words: Vec<&str> = kw_lower.split_whitespace().collect();
    if words.len() > 2 {
        return false;
    }
    words.iter().any(|w| tax.is_main_subject(w)) || tax.has_grade_label(&words)
}

/// Multi-word and not a bare grade/subject tag.
pub fn is_specific(kw_lower: &str, tax: &Taxonomy) -> bool {
    kw_lower.split_whitespace().count() >= 2 && !is_generic(kw_lower, tax)
}

/// Score one resource against the profile using the shared taxonomy.
pub fn score_resource(res: &Resource, profile: &KeywordProfile) -> Relevance {
    let rel = score_with_taxonomy(res, profile, taxonomy());
    dev_log_relevance(&res.url, &rel);
    rel
}

pub fn score_with_taxonomy(res: &Resource, profile: &KeywordProfile, tax: &Taxonomy) -> Relevance {
    let title = res.title.to_lowercase();
    let text = format!("{} {}", title, res.description.to_lowercase());

    let mut rel = Relevance::default();

    for kw in &profile.specific {
        if text.contains(kw.as_str()) {
            rel.score += 3;
            if title.contains(kw.as_str()) {
                rel.score += 2;
                rel.reasons.push(format!("specific keyword in title: {kw}"));
            } else {
                rel.reasons.push(format!("specific keyword: {kw}"));
            }
        }
    }

    for kw in &profile.keywords {
        if text.contains(kw.as_str()) {
            rel.score += 1;
            rel.matched.push(kw.clone());
        }
    }

    for (i, domain) in tax.domains.iter().enumerate() {
        if !domain.triggered_by(&text, &res.subject) {
            continue;
        }
        let before = rel.score;

        for term in &domain.terms {
            if text.contains(term.as_str()) {
                rel.score += 2;
                if title.contains(term.as_str()) {
                    rel.score += 1;
                }
                rel.matched.push(term.clone());
            }
        }

        if let Some(kws) = profile.related.get(i) {
            for kw in kws {
                if text.contains(kw.as_str()) {
                    rel.score += 1;
                }
            }
        }

        if let Some(boost) = &domain.tutorial_boost {
            let subject_hit = boost.subjects.iter().any(|s| text.contains(s.as_str()));
            let signal_hit = boost.signals.iter().any(|s| text.contains(s.as_str()));
            if subject_hit && signal_hit {
                rel.score += boost.bonus;
                rel.reasons.push(format!("{} tutorial boost", domain.name));
            }
        }

        if rel.score > before {
            rel.reasons
                .push(format!("{} domain +{}", domain.name, rel.score - before));
        }
    }

    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(title: &str, description: &str, subject: &str) -> Resource {
        Resource {
            title: title.into(),
            url: "https://example.test/r".into(),
            description: description.into(),
            subject: subject.into(),
            kind: "resource".into(),
            estimated_time: "5 minutes".into(),
            relevance_score: None,
            content_text: None,
        }
    }

    #[test]
    fn classifies_specific_keywords() {
        let t = taxonomy();
        assert!(is_specific("watercolor painting", t));
        assert!(is_specific("fun science experiments", t));
        assert!(!is_specific("art", t));
        assert!(!is_specific("3rd grade", t));
        assert!(!is_specific("math games", t));
        assert!(!is_specific("kindergarten phonics", t));
        // substring of a subject word is not the subject
        assert!(is_specific("mathematics games", t));
    }

    #[test]
    fn topic_terms_double_count_related_keywords() {
        // "art history" relates to art, and "art history" is an art term;
        // it is also generic (contains "art" and "history" as subject words).
        let p = KeywordProfile::new(&["art history"]);
        assert_eq!(p.specific(), &["art history".to_string()]);

        let p = KeywordProfile::new(&["digital art lessons"]);
        // specific once for being multi-word, once more for the "digital art" term
        assert_eq!(p.specific().len(), 2);
    }

    #[test]
    fn specific_title_match_scores_five_plus_one() {
        let p = KeywordProfile::new(&["ocean tides"]);
        let r = res("Ocean tides explained", "short clip", "Educational");
        // specific +3 +2 (title), generic +1; no domain triggered
        assert_eq!(score_resource(&r, &p).score, 6);

        let r = res("Explained", "all about ocean tides", "Educational");
        assert_eq!(score_resource(&r, &p).score, 4);
    }

    #[test]
    fn subject_activates_domain_boost() {
        let p = KeywordProfile::new(&["shapes"]);
        let plain = res("Shapes with clay", "make shapes", "Educational");
        let art = res("Shapes with clay", "make shapes", "art");
        let s_plain = score_resource(&plain, &p).score;
        let s_art = score_resource(&art, &p).score;
        assert_eq!(s_plain, 1);
        // clay: +2 (text) +1 (title)
        assert_eq!(s_art, 4);
    }

    #[test]
    fn music_tutorial_boost_is_flat() {
        let p = KeywordProfile::new(&["zzz"]);
        let r = res("Learn piano and guitar", "", "music");
        let rel = score_resource(&r, &p);
        // piano +3, guitar +3, tutorial boost +3
        assert_eq!(rel.score, 9);
        assert!(rel.reasons.iter().any(|x| x.contains("tutorial boost")));
    }

    #[test]
    fn unrelated_resource_scores_zero() {
        let p = KeywordProfile::new(&["watercolor painting", "art"]);
        let r = res("Random Worksheet", "Educational resource about Educational", "Educational");
        assert_eq!(score_resource(&r, &p).score, 0);
    }

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("https://example.test/a");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("https://example.test/a"));
        assert_ne!(a, anon_hash("https://example.test/b"));
    }
}
