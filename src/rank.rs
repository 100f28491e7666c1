// src/rank.rs
use crate::ingest::types::Resource;
use crate::relevance::{score_resource, KeywordProfile};

/// Default number of resources kept after ranking.
pub const DEFAULT_RESULT_CAP: usize = 10;

/// Score every resource; drop zero scores (the inclusion gate).
/// Returns the survivors with `relevance_score` set, in input order, plus the gated count.
pub fn score_and_gate(resources: Vec<Resource>, profile: &KeywordProfile) -> (Vec<Resource>, usize) {
    let total = resources.len();
    let kept: Vec<Resource> = resources
        .into_iter()
        .filter_map(|mut r| {
            let rel = score_resource(&r, profile);
            if rel.score == 0 {
                return None;
            }
            r.relevance_score = Some(rel.score);
            Some(r)
        })
        .collect();
    let gated = total - kept.len();
    (kept, gated)
}

/// Stable sort by score (descending), then keep the top `cap`.
pub fn rank(mut scored: Vec<Resource>, cap: usize) -> Vec<Resource> {
    // sort_by_key is stable: equal scores keep input order
    scored.sort_by_key(|r| std::cmp::Reverse(r.relevance_score.unwrap_or(0)));
    scored.truncate(cap);
    scored
}
