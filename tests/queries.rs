//! Query planning integration tests
//!
//! Boolean combinations, counting, pagination, and the aggregate cache,
//! exercised through the public facade over the in-memory backend.

use std::time::Duration;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use tagbase::{CountQuery, Error, Query, SaveOptions, ScoreRange, Tagbase, Where};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    label: String,
    rank: f64,
}

fn item(label: &str, rank: f64) -> Item {
    Item {
        label: label.to_string(),
        rank,
    }
}

fn rank(i: &Item) -> f64 {
    i.rank
}

fn db() -> Tagbase<Item> {
    Tagbase::in_memory("query-tests")
}

fn ids(hits: Vec<tagbase::Entry<Item>>) -> Vec<String> {
    hits.into_iter().map(|e| e.id).collect()
}

// ============================================================================
// Boolean combinations
// ============================================================================

#[test]
fn test_and_of_disjoint_tags_is_empty() {
    let db = db();
    db.save("1", &item("1", 1.0), SaveOptions::new().tag("foo")).unwrap();
    db.save("2", &item("2", 2.0), SaveOptions::new().tag("bar")).unwrap();

    assert!(db
        .filter(&Query::filtered(Where::all_of(["foo", "bar"])))
        .unwrap()
        .is_empty());
    assert_eq!(
        db.count(&CountQuery::filtered(Where::all_of(["foo", "bar"])))
            .unwrap(),
        0
    );
}

#[test]
fn test_or_unions_disjoint_tags() {
    let db = db();
    db.save("1", &item("1", 1.0), SaveOptions::new().tag("foo").sort_by(rank))
        .unwrap();
    db.save("2", &item("2", 2.0), SaveOptions::new().tag("bar").sort_by(rank))
        .unwrap();

    let hits = db
        .filter(&Query::filtered(Where::any_of(["foo", "bar"])))
        .unwrap();
    assert_eq!(ids(hits), vec!["1", "2"]);
    assert_eq!(
        db.count(&CountQuery::filtered(Where::any_of(["foo", "bar"])))
            .unwrap(),
        2
    );
}

#[test]
fn test_and_matches_shared_members_only() {
    let db = db();
    db.save("both", &item("b", 1.0), SaveOptions::new().tags(["foo", "bar"]))
        .unwrap();
    db.save("foo-only", &item("f", 2.0), SaveOptions::new().tag("foo")).unwrap();
    db.save("bar-only", &item("r", 3.0), SaveOptions::new().tag("bar")).unwrap();

    let hits = db
        .filter(&Query::filtered(Where::all_of(["foo", "bar"])))
        .unwrap();
    assert_eq!(ids(hits), vec!["both"]);
}

#[test]
fn test_and_works_across_hierarchy_levels() {
    let db = db();
    db.save(
        "x",
        &item("x", 1.0),
        SaveOptions::new().tags(["region/eu/fr", "tier/gold"]),
    )
    .unwrap();
    db.save(
        "y",
        &item("y", 2.0),
        SaveOptions::new().tags(["region/us", "tier/gold"]),
    )
    .unwrap();

    // Ancestor paths participate in combinations like any other tag
    let hits = db
        .filter(&Query::filtered(Where::all_of(["region/eu", "tier/gold"])))
        .unwrap();
    assert_eq!(ids(hits), vec!["x"]);
}

#[test]
fn test_mixed_and_or() {
    let db = db();
    db.save("1", &item("1", 1.0), SaveOptions::new().tags(["a", "c"]).sort_by(rank))
        .unwrap();
    db.save("2", &item("2", 2.0), SaveOptions::new().tags(["b", "c"]).sort_by(rank))
        .unwrap();
    db.save("3", &item("3", 3.0), SaveOptions::new().tags(["a", "b"]).sort_by(rank))
        .unwrap();

    // (a OR b) AND c
    let filter = Where::Query {
        and: vec!["c".to_string()],
        or: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(ids(db.filter(&Query::filtered(filter)).unwrap()), vec!["1", "2"]);
}

#[test]
fn test_single_element_or_alongside_and_rejected() {
    let db = db();
    let filter = Where::Query {
        and: vec!["a".to_string()],
        or: vec!["b".to_string()],
    };
    assert!(matches!(
        db.filter(&Query::filtered(filter)),
        Err(Error::InvalidQuery(_))
    ));
}

#[test]
fn test_tag_listing_rejects_and() {
    let db = db();
    assert!(matches!(
        db.tags(&Query::filtered(Where::all_of(["a", "b"]))),
        Err(Error::InvalidQuery(_))
    ));
}

// ============================================================================
// Counting
// ============================================================================

#[test]
fn test_count_with_score_range() {
    let db = db();
    for (id, r) in [("a", 1.0), ("b", 5.0), ("c", 9.0)] {
        db.save(id, &item(id, r), SaveOptions::new().tag("t").sort_by(rank))
            .unwrap();
    }

    assert_eq!(db.count(&CountQuery::filtered("t")).unwrap(), 3);
    assert_eq!(
        db.count(&CountQuery::filtered("t").range(ScoreRange::between(2.0, 9.0)))
            .unwrap(),
        2
    );
    assert_eq!(
        db.count(&CountQuery::filtered("t").range(ScoreRange::between(5.0, 5.0)))
            .unwrap(),
        1
    );
}

// ============================================================================
// Aggregate cache
// ============================================================================

#[test]
fn test_aggregate_staleness_window() {
    let db = db();
    db.save("1", &item("1", 1.0), SaveOptions::new().tag("foo")).unwrap();

    let filter = Where::any_of(["foo", "bar"]);
    assert_eq!(db.count(&CountQuery::filtered(filter.clone())).unwrap(), 1);

    // Saves inside the cache window are invisible to the same combination
    db.save("2", &item("2", 2.0), SaveOptions::new().tag("bar")).unwrap();
    assert_eq!(db.count(&CountQuery::filtered(filter.clone())).unwrap(), 1);

    // and visible after it lapses
    db.store().advance_clock(Duration::from_secs(11));
    assert_eq!(db.count(&CountQuery::filtered(filter)).unwrap(), 2);
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn test_offset_and_limit() {
    let db = db();
    for i in 0..5 {
        db.save(
            &format!("id-{i}"),
            &item("x", i as f64),
            SaveOptions::new().tag("t").sort_by(rank),
        )
        .unwrap();
    }

    let page = db.filter(&Query::filtered("t").offset(1).limit(2)).unwrap();
    assert_eq!(ids(page), vec!["id-1", "id-2"]);

    let past_end = db.filter(&Query::filtered("t").offset(10)).unwrap();
    assert!(past_end.is_empty());
}

#[test]
fn test_default_limit_caps_results() {
    let db = db();
    for i in 0..30 {
        db.save(
            &format!("id-{i}"),
            &item("x", i as f64),
            SaveOptions::new().tag("t").sort_by(rank),
        )
        .unwrap();
    }

    let page = db.filter(&Query::filtered("t")).unwrap();
    assert_eq!(page.len(), tagbase::DEFAULT_QUERY_LIMIT);
}

proptest! {
    // Walking pages end to end visits every entry exactly once, in order
    #[test]
    fn test_paged_walk_is_complete(entries in 1usize..40, page_size in 1usize..10) {
        let db = db();
        for i in 0..entries {
            db.save(
                &format!("id-{i:02}"),
                &item("x", i as f64),
                SaveOptions::new().tag("t").sort_by(rank),
            )
            .unwrap();
        }

        let mut seen = Vec::new();
        loop {
            let page = db
                .filter(&Query::filtered("t").offset(seen.len()).limit(page_size))
                .unwrap();
            if page.is_empty() {
                break;
            }
            prop_assert!(page.len() <= page_size);
            seen.extend(ids(page));
        }

        let expected: Vec<String> = (0..entries).map(|i| format!("id-{i:02}")).collect();
        prop_assert_eq!(seen, expected);
    }
}
