//! Keyword taxonomy: subject domains with their trigger, terminology and cue sets.
//!
//! The table is embedded at compile time from `taxonomy.toml` and parsed once.
//! It is a process-wide constant; the scorer and the normalizer only ever read it.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

static TAXONOMY: Lazy<Taxonomy> = Lazy::new(|| {
    let raw = include_str!("../taxonomy.toml");
    Taxonomy::from_toml_str(raw).expect("valid embedded taxonomy")
});

/// Shared taxonomy parsed from the embedded data file.
pub fn taxonomy() -> &'static Taxonomy {
    &TAXONOMY
}

#[derive(Debug, Clone, Deserialize)]
pub struct Taxonomy {
    /// Top-level subject names; a short keyword made of these is not "specific".
    pub main_subjects: Vec<String>,
    /// Grade labels ("3rd grade", "kindergarten", ...).
    pub grade_labels: Vec<String>,
    /// Interest category → cue substrings, used to pick crawlers.
    #[serde(default)]
    pub interests: BTreeMap<String, Vec<String>>,
    pub domains: Vec<Domain>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    pub name: String,
    pub subject: String,
    pub triggers: Vec<String>,
    pub keyword_markers: Vec<String>,
    #[serde(default)]
    pub subject_cues: Vec<String>,
    pub terms: Vec<String>,
    #[serde(default)]
    topic_terms: Vec<String>,
    #[serde(default)]
    pub tutorial_boost: Option<TutorialBoost>,
}

/// Flat bonus when any `subjects` entry co-occurs with any `signals` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TutorialBoost {
    pub subjects: Vec<String>,
    pub signals: Vec<String>,
    pub bonus: u32,
}

impl Taxonomy {
    /// Parse and canonicalize (lower-case, dedup in order) a taxonomy document.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut t: Taxonomy = toml::from_str(s)?;
        t.main_subjects = canonical(t.main_subjects);
        t.grade_labels = canonical(t.grade_labels);
        for cues in t.interests.values_mut() {
            *cues = canonical(std::mem::take(cues));
        }
        for d in &mut t.domains {
            if d.name.trim().is_empty() {
                anyhow::bail!("taxonomy domain with empty name");
            }
            d.subject = d.subject.trim().to_lowercase();
            d.triggers = canonical(std::mem::take(&mut d.triggers));
            d.keyword_markers = canonical(std::mem::take(&mut d.keyword_markers));
            d.subject_cues = canonical(std::mem::take(&mut d.subject_cues));
            d.terms = canonical(std::mem::take(&mut d.terms));
            d.topic_terms = canonical(std::mem::take(&mut d.topic_terms));
            if let Some(b) = &mut d.tutorial_boost {
                b.subjects = canonical(std::mem::take(&mut b.subjects));
                b.signals = canonical(std::mem::take(&mut b.signals));
            }
        }
        Ok(t)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// First domain (in table order) whose subject cues appear in any of `haystacks`.
    pub fn infer_subject(&self, haystacks: &[&str]) -> Option<&str> {
        let lowered: Vec<String> = haystacks.iter().map(|h| h.to_lowercase()).collect();
        self.domains
            .iter()
            .find(|d| {
                d.subject_cues
                    .iter()
                    .any(|cue| lowered.iter().any(|h| h.contains(cue.as_str())))
            })
            .map(|d| d.subject.as_str())
    }

    /// Interest categories whose cues occur in any keyword.
    pub fn detect_interests<S: AsRef<str>>(&self, keywords: &[S]) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for kw in keywords {
            let kw = kw.as_ref().to_lowercase();
            for (interest, cues) in &self.interests {
                if cues.iter().any(|c| kw.contains(c.as_str())) {
                    out.insert(interest.clone());
                }
            }
        }
        out
    }

    /// True when the lower-cased word sequence contains a grade label as whole words.
    pub fn has_grade_label(&self, words: &[&str]) -> bool {
        self.grade_labels
            .iter()
            .any(|g| contains_word_run(words, g))
    }

    pub fn is_main_subject(&self, word: &str) -> bool {
        self.main_subjects.iter().any(|s| s == word)
    }
}

impl Domain {
    /// Terms whose presence inside a related keyword marks it as specific.
    pub fn topic_terms(&self) -> &[String] {
        if self.topic_terms.is_empty() {
            &self.terms
        } else {
            &self.topic_terms
        }
    }

    /// Does the (lower-cased) text activate this domain?
    pub fn triggered_by(&self, text_lower: &str, subject: &str) -> bool {
        self.triggers.iter().any(|t| text_lower.contains(t.as_str()))
            || subject.trim().eq_ignore_ascii_case(&self.subject)
    }

    /// Is the keyword "related" to this domain (contains one of its markers)?
    pub fn relates_to(&self, keyword_lower: &str) -> bool {
        self.keyword_markers
            .iter()
            .any(|m| keyword_lower.contains(m.as_str()))
    }
}

fn contains_word_run(words: &[&str], phrase: &str) -> bool {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words.windows(needle.len()).any(|w| w == needle.as_slice())
}

fn canonical(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() && seen.insert(t.clone()) {
            out.push(t);
        }
    }
    out
}
