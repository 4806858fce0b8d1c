//! Sort/Filter Strategies
//!
//! Each strategy borrows its input and returns a new ordering of references.
//! All sorts are stable: equal keys keep their input order.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::record::ContentRecord;
use super::scoring::HotDecay;

/// Trending now: decayed engagement, newest first on ties
pub fn sort_by_hot<'a, I>(records: I, now: DateTime<Utc>) -> Vec<&'a ContentRecord>
where
    I: IntoIterator<Item = &'a ContentRecord>,
{
    sort_by_hot_with(records, now, &HotDecay::default())
}

pub fn sort_by_hot_with<'a, I>(
    records: I,
    now: DateTime<Utc>,
    decay: &HotDecay,
) -> Vec<&'a ContentRecord>
where
    I: IntoIterator<Item = &'a ContentRecord>,
{
    // Score once per record, not once per comparison
    let mut keyed: Vec<(f64, &ContentRecord)> = records
        .into_iter()
        .map(|r| (decay.hot_score(r, now), r))
        .collect();

    keyed.sort_by(|(a_hot, a), (b_hot, b)| {
        b_hot
            .total_cmp(a_hot)
            .then_with(|| newest_first(a, b))
    });

    keyed.into_iter().map(|(_, r)| r).collect()
}

/// All-time best by `bull_score`. Equal scores keep input order.
pub fn sort_by_top_rated<'a, I>(records: I) -> Vec<&'a ContentRecord>
where
    I: IntoIterator<Item = &'a ContentRecord>,
{
    let mut sorted: Vec<&ContentRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| b.bull_score.total_cmp(&a.bull_score));
    sorted
}

/// Newest first, id ascending on equal timestamps
pub fn sort_by_fresh<'a, I>(records: I) -> Vec<&'a ContentRecord>
where
    I: IntoIterator<Item = &'a ContentRecord>,
{
    let mut sorted: Vec<&ContentRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| newest_first(a, b).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// Keep posts from verified or smart money authors, in input order
pub fn filter_smart_money<'a, I>(records: I) -> Vec<&'a ContentRecord>
where
    I: IntoIterator<Item = &'a ContentRecord>,
{
    records.into_iter().filter(|r| r.is_smart_money()).collect()
}

fn newest_first(a: &ContentRecord, b: &ContentRecord) -> Ordering {
    b.created_or_min().cmp(&a.created_or_min())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::record::{AuthorProfile, ReactionCounts};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()
    }

    fn ids(records: &[&ContentRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<ContentRecord> = Vec::new();
        assert!(sort_by_hot(&empty, t0()).is_empty());
        assert!(sort_by_top_rated(&empty).is_empty());
        assert!(sort_by_fresh(&empty).is_empty());
        assert!(filter_smart_money(&empty).is_empty());
    }

    #[test]
    fn test_top_rated_scenario() {
        let records: Vec<ContentRecord> = [10.0, 30.0, 5.0, 30.0, 0.0]
            .iter()
            .enumerate()
            .map(|(i, score)| {
                ContentRecord::new(i.to_string())
                    .with_bull_score(*score)
                    .with_created_at(t0() + Duration::minutes(i as i64))
            })
            .collect();

        let sorted = sort_by_top_rated(&records);
        assert_eq!(ids(&sorted), vec!["1", "3", "0", "2", "4"]);
    }

    #[test]
    fn test_recency_ordering_for_fresh_and_hot() {
        let reactions = ReactionCounts::new(2, 0, 1);
        let records: Vec<ContentRecord> = (1..=3)
            .map(|i| {
                ContentRecord::new(format!("t{}", i))
                    .with_engagement(40, reactions, 2)
                    .with_bull_score(12.0)
                    .with_created_at(t0() + Duration::hours(i))
            })
            .collect();
        let now = t0() + Duration::hours(6);

        assert_eq!(ids(&sort_by_fresh(&records)), vec!["t3", "t2", "t1"]);
        assert_eq!(ids(&sort_by_hot(&records, now)), vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_fresh_keeps_input_order_on_full_ties() {
        let records = vec![
            ContentRecord::new("dup").with_title("first").with_created_at(t0()),
            ContentRecord::new("dup").with_title("second").with_created_at(t0()),
            ContentRecord::new("dup").with_title("third").with_created_at(t0()),
        ];

        let titles: Vec<&str> = sort_by_fresh(&records)
            .into_iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_fresh_ties_break_on_id() {
        let records = vec![
            ContentRecord::new("b").with_created_at(t0()),
            ContentRecord::new("a").with_created_at(t0()),
            ContentRecord::new("c").with_created_at(t0() + Duration::seconds(1)),
            ContentRecord::new("undated"),
        ];

        assert_eq!(ids(&sort_by_fresh(&records)), vec!["c", "a", "b", "undated"]);
    }

    #[test]
    fn test_hot_ties_keep_input_order() {
        // Identical hot score and timestamp: only stability decides
        let records = vec![
            ContentRecord::new("x").with_bull_score(3.0).with_created_at(t0()),
            ContentRecord::new("y").with_bull_score(3.0).with_created_at(t0()),
            ContentRecord::new("z").with_bull_score(3.0).with_created_at(t0()),
        ];

        assert_eq!(ids(&sort_by_hot(&records, t0())), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_hot_underflow_falls_back_to_recency() {
        let records = vec![
            ContentRecord::new("older").with_bull_score(100.0).with_created_at(t0()),
            ContentRecord::new("newer").with_bull_score(1.0).with_created_at(t0() + Duration::days(1)),
        ];
        let far_future = t0() + Duration::days(365 * 200);

        assert_eq!(ids(&sort_by_hot(&records, far_future)), vec!["newer", "older"]);
    }

    #[test]
    fn test_smart_money_filter_preserves_order() {
        let verified = AuthorProfile {
            id: Some("u2".into()),
            is_verified: true,
            ..Default::default()
        };
        let smart = AuthorProfile {
            id: Some("u4".into()),
            is_smart_money: true,
            ..Default::default()
        };
        let plain = |id: &str| AuthorProfile {
            id: Some(id.into()),
            ..Default::default()
        };

        let records = vec![
            ContentRecord::new("p1").with_author(plain("u1")),
            ContentRecord::new("p2").with_author(verified),
            ContentRecord::new("p3").with_author(plain("u3")),
            ContentRecord::new("p4").with_author(smart),
        ];

        assert_eq!(ids(&filter_smart_money(&records)), vec!["p2", "p4"]);
    }

    #[test]
    fn test_strategies_do_not_mutate_input() {
        let records = vec![
            ContentRecord::new("a").with_bull_score(1.0).with_created_at(t0()),
            ContentRecord::new("b").with_bull_score(9.0).with_created_at(t0() + Duration::hours(1)),
            ContentRecord::new("c").with_bull_score(4.0),
        ];
        let before = records.clone();

        let _ = sort_by_hot(&records, t0());
        let _ = sort_by_top_rated(&records);
        let _ = sort_by_fresh(&records);
        let _ = filter_smart_money(&records);

        assert_eq!(records, before);
    }

    #[test]
    fn test_strategies_chain_over_references() {
        let star = AuthorProfile {
            is_smart_money: true,
            ..Default::default()
        };
        let records = vec![
            ContentRecord::new("low").with_author(star.clone()).with_bull_score(1.0),
            ContentRecord::new("skip").with_bull_score(50.0),
            ContentRecord::new("high").with_author(star).with_bull_score(8.0),
        ];

        let chained = sort_by_top_rated(filter_smart_money(&records));
        assert_eq!(ids(&chained), vec!["high", "low"]);
    }
}
