//! Ranking Metrics and Performance Monitoring
//!
//! Per-pass summaries for logging, plus the process-wide `metrics` counters.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use super::record::ContentRecord;
use super::selection::FeedStrategy;

/// Summary of a single ranking pass
#[derive(Debug, Clone, Serialize)]
pub struct RankingMetrics {
    pub request_id: String,
    pub timestamp: i64,
    pub strategy: FeedStrategy,
    pub duration_ms: u64,

    pub snapshot_size: usize,
    pub visible: usize,
    pub matched: usize,
    pub returned: usize,

    pub avg_bull_score: f64,
    pub unique_authors: usize,
    pub market_distribution: BTreeMap<String, usize>,
}

impl RankingMetrics {
    pub fn new(strategy: FeedStrategy) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            strategy,
            duration_ms: 0,
            snapshot_size: 0,
            visible: 0,
            matched: 0,
            returned: 0,
            avg_bull_score: 0.0,
            unique_authors: 0,
            market_distribution: BTreeMap::new(),
        }
    }

    /// Fill the quality fields from the page handed to the presentation layer
    pub fn observe_page(&mut self, page: &[ContentRecord]) {
        self.returned = page.len();
        self.avg_bull_score = if page.is_empty() {
            0.0
        } else {
            page.iter().map(|r| r.bull_score).sum::<f64>() / page.len() as f64
        };

        let mut authors: Vec<&str> = page
            .iter()
            .filter_map(|r| r.author.as_ref().and_then(|a| a.id.as_deref()))
            .collect();
        authors.sort_unstable();
        authors.dedup();
        self.unique_authors = authors.len();

        self.market_distribution.clear();
        for record in page {
            let market = record.market.map(|m| m.as_str()).unwrap_or("unknown");
            *self.market_distribution.entry(market.to_string()).or_insert(0) += 1;
        }
    }

    /// Push the pass into the global recorder
    pub fn record(&self) {
        metrics::counter!("bullfeed_rank_requests_total", "strategy" => self.strategy.as_str())
            .increment(1);
        metrics::histogram!("bullfeed_records_ranked").record(self.matched as f64);
        metrics::histogram!("bullfeed_rank_duration_ms").record(self.duration_ms as f64);
    }

    /// Flag passes that look wrong to a reader of the logs
    pub fn detect_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.snapshot_size > 0 && self.visible == 0 {
            issues.push("No published records in snapshot".to_string());
        }

        if self.duration_ms > 50 {
            issues.push(format!("Slow ranking pass: {}ms", self.duration_ms));
        }

        if self.returned > 3 && self.unique_authors == 1 {
            issues.push("Single author fills the page".to_string());
        }

        issues
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: &'static str,
}

impl PerformanceTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        tracing::trace!("⏱️ {} completed in {}ms", self.label, self.elapsed_ms());
    }
}
