//! Feed Selection Facade
//!
//! Turns an unfiltered snapshot and a [`FeedQuery`] into the page the
//! presentation layer renders. Step order is fixed:
//!
//! 1. drop unpublished records and recompute `bull_score` from counters
//! 2. market filter
//! 3. content type filter
//! 4. search filter
//! 5. exactly one strategy
//! 6. offset/limit window

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::metrics::{PerformanceTimer, RankingMetrics};
use super::record::ContentRecord;
use super::scoring::{HotDecay, ScoringWeights};
use super::selection::{FeedQuery, FeedStrategy};
use super::strategies;
use crate::config::FeedConfig;

/// A ranked page of the feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<ContentRecord>,
    /// Records that survived filtering, before paging
    pub total: usize,
    pub has_more: bool,
    pub strategy: FeedStrategy,
}

/// Main ranking engine
#[derive(Debug, Clone, Default)]
pub struct FeedEngine {
    weights: ScoringWeights,
    decay: HotDecay,
    smart_money_rank_top: bool,
}

impl FeedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_decay(mut self, decay: HotDecay) -> Self {
        self.decay = decay;
        self
    }

    /// Rank the smart money subset by top rated instead of keeping input order
    pub fn with_smart_money_rank_top(mut self, enabled: bool) -> Self {
        self.smart_money_rank_top = enabled;
        self
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            weights: config.weights,
            decay: HotDecay {
                half_life_hours: config.hot_half_life_hours,
            },
            smart_money_rank_top: config.smart_money_rank_top,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Visible records with a freshly computed `bull_score`
    pub fn annotate(&self, records: &[ContentRecord]) -> Vec<ContentRecord> {
        records
            .iter()
            .filter(|r| r.is_visible())
            .map(|r| {
                let mut scored = r.clone();
                scored.bull_score = self.weights.score_record(r);
                scored
            })
            .collect()
    }

    /// Filter and order already annotated records (steps 2-5)
    pub fn rank<'a>(
        &self,
        scored: &'a [ContentRecord],
        query: &FeedQuery,
        now: DateTime<Utc>,
    ) -> Vec<&'a ContentRecord> {
        let needle = query.search_needle();

        let filtered = scored
            .iter()
            .filter(|r| query.markets.admits(r.market.as_ref()))
            .filter(|r| query.content_types.admits(Some(&r.content_type)))
            .filter(|r| needle.as_deref().map_or(true, |n| r.matches_needle(n)));

        match query.strategy {
            FeedStrategy::Hot => strategies::sort_by_hot_with(filtered, now, &self.decay),
            FeedStrategy::Top => strategies::sort_by_top_rated(filtered),
            FeedStrategy::SmartMoney if self.smart_money_rank_top => {
                strategies::sort_by_top_rated(strategies::filter_smart_money(filtered))
            }
            FeedStrategy::SmartMoney => strategies::filter_smart_money(filtered),
            FeedStrategy::Fresh => strategies::sort_by_fresh(filtered),
        }
    }

    /// Full pipeline over an unfiltered snapshot
    pub fn select(
        &self,
        records: &[ContentRecord],
        query: &FeedQuery,
        now: DateTime<Utc>,
    ) -> FeedPage {
        let timer = PerformanceTimer::new("feed_select");
        let mut metrics = RankingMetrics::new(query.strategy);
        metrics.snapshot_size = records.len();

        let scored = self.annotate(records);
        metrics.visible = scored.len();

        let ranked = self.rank(&scored, query, now);
        let total = ranked.len();
        metrics.matched = total;

        let items: Vec<ContentRecord> = ranked
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        let has_more = query.offset.saturating_add(items.len()) < total;

        metrics.duration_ms = timer.elapsed_ms();
        metrics.observe_page(&items);
        metrics.record();

        for issue in metrics.detect_issues() {
            warn!(request_id = %metrics.request_id, "Feed quality: {}", issue);
        }
        debug!(
            request_id = %metrics.request_id,
            strategy = %query.strategy,
            snapshot = metrics.snapshot_size,
            matched = total,
            returned = items.len(),
            "Ranked feed"
        );

        FeedPage {
            items,
            total,
            has_more,
            strategy: query.strategy,
        }
    }
}

/// Rank a snapshot with default weights and decay, without paging
pub fn select_feed(
    records: &[ContentRecord],
    query: &FeedQuery,
    now: DateTime<Utc>,
) -> Vec<ContentRecord> {
    let unpaged = FeedQuery {
        offset: 0,
        limit: None,
        ..query.clone()
    };
    FeedEngine::default().select(records, &unpaged, now).items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::record::{AuthorProfile, ContentType, Market, ReactionCounts};
    use crate::feed::selection::{ContentTypeFilter, MarketFilter};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap()
    }

    fn sample() -> Vec<ContentRecord> {
        vec![
            ContentRecord::new("eur")
                .with_title("EUR/USD breakout")
                .with_pair("EUR/USD")
                .with_market(Market::Forex)
                .with_engagement(120, ReactionCounts::new(4, 1, 0), 2)
                .with_created_at(t0()),
            ContentRecord::new("btc")
                .with_title("Bitcoin pump incoming")
                .with_pair("BTC/USDT")
                .with_tickers(["BTC", "ETH"])
                .with_market(Market::Crypto)
                .with_content_type(ContentType::MarketPulse)
                .with_engagement(900, ReactionCounts::new(10, 6, 3), 8)
                .with_created_at(t0() + Duration::hours(1)),
            ContentRecord::new("gold")
                .with_title("Gold reversal setup")
                .with_pair("XAU/USD")
                .with_market(Market::Indices)
                .with_engagement(15, ReactionCounts::new(1, 0, 1), 0)
                .with_created_at(t0() + Duration::hours(2)),
        ]
    }

    fn ids(records: &[ContentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_search_filters_case_insensitively() {
        let records = sample();
        let now = t0() + Duration::hours(3);

        let gold = select_feed(&records, &FeedQuery::default().with_search("GOLD"), now);
        assert_eq!(ids(&gold), vec!["gold"]);

        let everything = select_feed(&records, &FeedQuery::default(), now);
        assert_eq!(everything.len(), 3);
    }

    #[test]
    fn test_padded_search_is_a_literal_substring() {
        let records = vec![
            ContentRecord::new("x").with_title("EURUSD long"),
            ContentRecord::new("y").with_title("EUR long"),
        ];

        let out = select_feed(&records, &FeedQuery::default().with_search("EUR "), t0());
        assert_eq!(ids(&out), vec!["y"]);
    }

    #[test]
    fn test_search_matches_tickers() {
        let records = sample();
        let eth = select_feed(&records, &FeedQuery::default().with_search("eth"), t0());
        assert_eq!(ids(&eth), vec!["btc"]);
    }

    #[test]
    fn test_market_and_type_filters() {
        let records = sample();
        let query = FeedQuery::new(FeedStrategy::Top)
            .with_markets(MarketFilter::only([Market::Forex, Market::Crypto]));
        assert_eq!(ids(&select_feed(&records, &query, t0())), vec!["btc", "eur"]);

        let pulses = FeedQuery::default()
            .with_content_types(ContentTypeFilter::only([ContentType::MarketPulse]));
        assert_eq!(ids(&select_feed(&records, &pulses, t0())), vec!["btc"]);
    }

    #[test]
    fn test_unpublished_and_unknown_visibility_excluded() {
        let mut records = sample();
        records[0].is_published = Some(false);
        records[1].is_published = None;

        let out = select_feed(&records, &FeedQuery::default(), t0());
        assert_eq!(ids(&out), vec!["gold"]);
    }

    #[test]
    fn test_stale_bull_score_is_recomputed() {
        let records = vec![
            ContentRecord::new("inflated").with_bull_score(9_999.0),
            ContentRecord::new("real").with_engagement(10, ReactionCounts::new(3, 0, 0), 0),
        ];

        let out = select_feed(&records, &FeedQuery::new(FeedStrategy::Top), t0());
        assert_eq!(ids(&out), vec!["real", "inflated"]);
        assert_eq!(out[1].bull_score, 0.0);
        assert_eq!(records[0].bull_score, 9_999.0);
    }

    #[test]
    fn test_smart_money_tab_modes() {
        let star = AuthorProfile {
            is_smart_money: true,
            ..Default::default()
        };
        let records = vec![
            ContentRecord::new("quiet").with_author(star.clone()),
            ContentRecord::new("crowd").with_engagement(50, ReactionCounts::new(9, 0, 0), 0),
            ContentRecord::new("loud")
                .with_author(star)
                .with_engagement(50, ReactionCounts::new(9, 0, 0), 0),
        ];
        let query = FeedQuery::new(FeedStrategy::SmartMoney);

        let preserved = FeedEngine::new().select(&records, &query, t0());
        assert_eq!(ids(&preserved.items), vec!["quiet", "loud"]);

        let ranked = FeedEngine::new()
            .with_smart_money_rank_top(true)
            .select(&records, &query, t0());
        assert_eq!(ids(&ranked.items), vec!["loud", "quiet"]);
    }

    #[test]
    fn test_paging_window() {
        let records = sample();
        let engine = FeedEngine::new();

        let first = engine.select(&records, &FeedQuery::default().with_page(0, Some(2)), t0());
        assert_eq!(ids(&first.items), vec!["gold", "btc"]);
        assert_eq!(first.total, 3);
        assert!(first.has_more);

        let last = engine.select(&records, &FeedQuery::default().with_page(2, Some(2)), t0());
        assert_eq!(ids(&last.items), vec!["eur"]);
        assert!(!last.has_more);

        let beyond = engine.select(&records, &FeedQuery::default().with_page(10, Some(2)), t0());
        assert!(beyond.items.is_empty());
        assert!(!beyond.has_more);
    }

    #[test]
    fn test_select_is_deterministic() {
        let records = sample();
        let now = t0() + Duration::hours(5);
        for strategy in FeedStrategy::ALL {
            let query = FeedQuery::new(strategy);
            let a = serde_json::to_string(&select_feed(&records, &query, now)).unwrap();
            let b = serde_json::to_string(&select_feed(&records, &query, now)).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_custom_weights_change_top_order() {
        let records = vec![
            ContentRecord::new("saved").with_engagement(0, ReactionCounts::new(0, 0, 2), 0),
            ContentRecord::new("bulled").with_engagement(0, ReactionCounts::new(4, 0, 0), 0),
        ];
        let query = FeedQuery::new(FeedStrategy::Top);

        let default = FeedEngine::new().select(&records, &query, t0());
        assert_eq!(ids(&default.items), vec!["bulled", "saved"]);

        let save_heavy = FeedEngine::new().with_weights(ScoringWeights {
            save: 10.0,
            ..ScoringWeights::default()
        });
        let reweighted = save_heavy.select(&records, &query, t0());
        assert_eq!(ids(&reweighted.items), vec!["saved", "bulled"]);
    }
}
