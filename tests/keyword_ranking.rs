//! Behaviour of the keyword aggregation engine on realistic inputs

use clusterlens::keywords::{compute_top_keywords, ItemKeywords, KeywordCount, KeywordError};
use std::collections::HashMap;

fn item(id: &str, pairs: &[(&str, u64)]) -> ItemKeywords {
    ItemKeywords::new(
        id,
        pairs.iter().map(|(k, c)| KeywordCount::new(*k, *c)).collect(),
    )
}

#[test]
fn tie_between_first_and_later_keyword_keeps_first_seen() {
    let map: HashMap<String, usize> = [("A", 0), ("B", 0), ("C", 1)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let items = vec![
        item("A", &[("x", 3), ("y", 1)]),
        item("B", &[("y", 2)]),
        item("C", &[("z", 5)]),
    ];

    let rankings = compute_top_keywords(&map, &items, 2, 1).unwrap();
    assert_eq!(rankings[0].cluster_index, 0);
    assert_eq!(rankings[0].top_keywords, vec!["x"]);
    assert_eq!(rankings[1].top_keywords, vec!["z"]);
}

#[test]
fn output_always_covers_every_cluster_index() {
    let map: HashMap<String, usize> = [("u1".to_string(), 5)].into_iter().collect();
    let items = vec![item("u1", &[("travel", 4), ("beach", 2)])];

    let rankings = compute_top_keywords(&map, &items, 18, 5).unwrap();
    assert_eq!(rankings.len(), 18);
    for (i, r) in rankings.iter().enumerate() {
        assert_eq!(r.cluster_index, i);
        if i == 5 {
            assert_eq!(r.top_keywords, vec!["travel", "beach"]);
        } else {
            assert!(r.top_keywords.is_empty());
        }
    }
}

#[test]
fn list_is_truncated_to_top_n() {
    let map: HashMap<String, usize> = [("u".to_string(), 0)].into_iter().collect();
    let items = vec![item(
        "u",
        &[("a", 1), ("b", 6), ("c", 3), ("d", 5), ("e", 2), ("f", 4)],
    )];
    let rankings = compute_top_keywords(&map, &items, 1, 3).unwrap();
    assert_eq!(rankings[0].top_keywords, vec!["b", "d", "f"]);
}

#[test]
fn unknown_cluster_index_is_reported() {
    let map: HashMap<String, usize> = [("u".to_string(), 18)].into_iter().collect();
    let items = vec![item("u", &[("a", 1)])];
    let err = compute_top_keywords(&map, &items, 18, 5).unwrap_err();
    assert!(matches!(
        err,
        KeywordError::UnknownClusterIndex { index: 18, cluster_count: 18, .. }
    ));
}

#[test]
fn repeated_calls_are_identical() {
    let map: HashMap<String, usize> = [("a", 0), ("b", 1), ("c", 0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let items = vec![
        item("a", &[("p", 2), ("q", 2), ("r", 2)]),
        item("b", &[("s", 1)]),
        item("c", &[("r", 1), ("q", 1)]),
    ];
    let first = compute_top_keywords(&map, &items, 2, 2).unwrap();
    let second = compute_top_keywords(&map, &items, 2, 2).unwrap();
    assert_eq!(first, second);
    // q and r tie at 3; q was seen first
    assert_eq!(first[0].top_keywords, vec!["q", "r"]);
}
