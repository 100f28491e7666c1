// tests/ranking.rs
use lesson_scout::ingest::types::Resource;
use lesson_scout::rank::{rank, score_and_gate, DEFAULT_RESULT_CAP};
use lesson_scout::relevance::KeywordProfile;

fn scored(tag: &str, score: u32) -> Resource {
    Resource {
        title: tag.into(),
        url: format!("https://r.test/{tag}"),
        description: "d".into(),
        subject: "Educational".into(),
        kind: "resource".into(),
        estimated_time: "5 minutes".into(),
        relevance_score: Some(score),
        content_text: None,
    }
}

#[test]
fn sorted_descending_and_capped() {
    let input: Vec<Resource> = (0..15).map(|i| scored(&format!("r{i}"), (i * 7) % 11 + 1)).collect();
    let out = rank(input, DEFAULT_RESULT_CAP);

    assert_eq!(out.len(), 10);
    let scores: Vec<u32> = out.iter().map(|r| r.relevance_score.unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
}

#[test]
fn equal_scores_keep_input_order() {
    let input = vec![
        scored("a", 2),
        scored("b", 5),
        scored("c", 2),
        scored("d", 5),
        scored("e", 2),
    ];
    let titles: Vec<String> = rank(input, 10).into_iter().map(|r| r.title).collect();
    assert_eq!(titles, ["b", "d", "a", "c", "e"]);
}

#[test]
fn short_input_is_not_padded() {
    assert_eq!(rank(vec![scored("a", 1)], 10).len(), 1);
    assert!(rank(Vec::new(), 10).is_empty());
}

#[test]
fn zero_scores_never_reach_the_ranker() {
    let mut hit = scored("Volcano experiments at home", 0);
    hit.relevance_score = None;
    let mut miss = scored("Knitting basics", 0);
    miss.relevance_score = None;

    let profile = KeywordProfile::new(&["volcano experiments"]);
    let (kept, gated) = score_and_gate(vec![miss, hit], &profile);

    assert_eq!(gated, 1);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].title, "Volcano experiments at home");
    assert!(kept[0].relevance_score.unwrap() > 0);
}
