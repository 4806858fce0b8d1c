//! End-to-end ranking through the public API
//!
//! Snapshots go in as raw JSON, the way the persistence side hands them over.

use bullfeed::feed::{
    calculate_bull_score, select_feed, sort_by_top_rated, ContentRecord, FeedEngine, FeedQuery,
    FeedStrategy, MarketFilter, ReactionCounts, Snapshot,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn ids(records: &[ContentRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn top_rated_scenario_keeps_input_order_on_ties() {
    let records: Vec<ContentRecord> = [10.0, 30.0, 5.0, 30.0, 0.0]
        .iter()
        .enumerate()
        .map(|(i, score)| ContentRecord::new(i.to_string()).with_bull_score(*score))
        .collect();

    let ranked: Vec<&str> = sort_by_top_rated(&records)
        .into_iter()
        .map(|r| r.id.as_str())
        .collect();

    assert_eq!(ranked, vec!["1", "3", "0", "2", "4"]);
}

#[test]
fn snapshot_from_upstream_envelope_ranks_every_tab() {
    let created = |hours: i64| (now() - Duration::hours(hours)).to_rfc3339();
    let raw = json!({
        "data": [
            {
                "id": "fresh-forex",
                "title": "EUR/USD range",
                "market": "forex",
                "created_at": created(1),
                "is_published": true
            },
            {
                "id": "old-crypto-hit",
                "title": "BTC cycle top",
                "market": "crypto",
                "created_at": created(96),
                "view_count": 5000,
                "reaction_counts": { "bull": 40, "bear": 2, "save": 10 },
                "comment_count": 12,
                "author": { "id": "u1", "is_verified": true },
                "is_published": true
            },
            {
                "id": "draft",
                "title": "unfinished",
                "created_at": created(0),
                "is_published": false
            },
            {
                "id": "mid-stocks",
                "title": "NVDA earnings",
                "market": "stocks",
                "tickers": ["NVDA", "AMD"],
                "created_at": created(6),
                "reaction_counts": { "bull": 6 },
                "author": { "id": "u2", "is_smart_money": true },
                "is_published": true
            }
        ],
        "error": null
    });

    let snapshot = Snapshot::from_value(raw).unwrap();
    assert_eq!(snapshot.len(), 4);
    let records = &snapshot.records;

    let fresh = select_feed(records, &FeedQuery::new(FeedStrategy::Fresh), now());
    assert_eq!(ids(&fresh), vec!["fresh-forex", "mid-stocks", "old-crypto-hit"]);

    let top = select_feed(records, &FeedQuery::new(FeedStrategy::Top), now());
    assert_eq!(ids(&top), vec!["old-crypto-hit", "mid-stocks", "fresh-forex"]);

    // Four days of decay sinks the old hit below a six-hour-old post
    let hot = select_feed(records, &FeedQuery::new(FeedStrategy::Hot), now());
    assert_eq!(ids(&hot), vec!["mid-stocks", "old-crypto-hit", "fresh-forex"]);

    let smart = select_feed(records, &FeedQuery::new(FeedStrategy::SmartMoney), now());
    assert_eq!(ids(&smart), vec!["old-crypto-hit", "mid-stocks"]);
}

#[test]
fn filters_compose_before_ranking() {
    let records = vec![
        ContentRecord::new("a")
            .with_title("Gold outlook")
            .with_market(bullfeed::feed::Market::Indices),
        ContentRecord::new("b")
            .with_title("Gold miners")
            .with_market(bullfeed::feed::Market::Stocks),
        ContentRecord::new("c").with_title("Silver squeeze"),
    ];

    let query = FeedQuery::new(FeedStrategy::Top)
        .with_markets(MarketFilter::parse_list("stocks,indices").unwrap())
        .with_search("gold");

    let out = select_feed(&records, &query, now());
    assert_eq!(ids(&out), vec!["a", "b"]);

    // Records without a market only show up under "all"
    let all = select_feed(&records, &FeedQuery::default().with_search("silver"), now());
    assert_eq!(ids(&all), vec!["c"]);
}

#[test]
fn ranking_leaves_the_snapshot_untouched() {
    let records = vec![
        ContentRecord::new("x")
            .with_engagement(99, ReactionCounts::new(3, 1, 1), 2)
            .with_bull_score(1.0),
        ContentRecord::new("y").with_created_at(now()),
    ];
    let before = records.clone();

    for strategy in FeedStrategy::ALL {
        let _ = FeedEngine::new().select(&records, &FeedQuery::new(strategy), now());
    }

    assert_eq!(records, before);
}

#[test]
fn bull_score_properties() {
    let base = ReactionCounts::new(3, 0, 1);
    let score = calculate_bull_score(100, &base, 2, 0.0);

    assert!(score >= 0.0);
    assert!(calculate_bull_score(100, &ReactionCounts::new(4, 0, 1), 2, 0.0) > score);
    assert!(calculate_bull_score(100, &ReactionCounts::new(3, 0, 2), 2, 0.0) > score);
    assert!(calculate_bull_score(101, &base, 2, 0.0) > score);
    assert!(calculate_bull_score(100, &base, 3, 0.0) > score);
    assert_eq!(
        calculate_bull_score(0, &ReactionCounts::new(0, 1_000, 0), 0, 0.0),
        0.0
    );
}
