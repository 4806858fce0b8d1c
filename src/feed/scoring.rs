//! Score Calculators
//!
//! `bull_score` is the all-time quality signal used by the Top tab.
//! The hot score decays it by age for the Hot tab.
//!
//! ```text
//! bull_score = max(FLOOR, 2.0*bull + 3.0*save + 1.0*comments + 1.0*ln(1 + views) - 0.5*bear)
//! hot_score  = (bull_score + 1) * 0.5^(age_hours / 24)
//! ```

use chrono::{DateTime, Utc};

use super::record::{ContentRecord, ReactionCounts};

/// Lowest possible bull score
pub const SCORE_FLOOR: f64 = 0.0;

/// Hours for a hot score to halve at constant engagement
pub const DEFAULT_HOT_HALF_LIFE_HOURS: f64 = 24.0;

/// Engagement weights (can be tuned)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub bull: f64,
    /// Subtracted per bear reaction, bounded by [`SCORE_FLOOR`]
    pub bear: f64,
    pub save: f64,
    /// Applied to `ln(1 + views)`
    pub view: f64,
    pub comment: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            bull: 2.0,
            bear: 0.5,
            save: 3.0, // saving is the strongest endorsement
            view: 1.0,
            comment: 1.0,
        }
    }
}

impl ScoringWeights {
    /// Weighted engagement, clamped at the floor. `_reserved` keeps call sites stable.
    pub fn bull_score(
        &self,
        view_count: u64,
        reactions: &ReactionCounts,
        comment_count: u64,
        _reserved: f64,
    ) -> f64 {
        let positive = self.bull * reactions.bull as f64
            + self.save * reactions.save as f64
            + self.comment * comment_count as f64
            + self.view * (view_count as f64).ln_1p();
        let raw = positive - self.bear * reactions.bear as f64;

        if raw.is_finite() {
            raw.max(SCORE_FLOOR)
        } else {
            SCORE_FLOOR
        }
    }

    /// Recompute a record's bull score from its counters
    pub fn score_record(&self, record: &ContentRecord) -> f64 {
        self.bull_score(
            record.view_count,
            &record.reaction_counts,
            record.comment_count,
            0.0,
        )
    }

    pub fn is_valid(&self) -> bool {
        [self.bull, self.bear, self.save, self.view, self.comment]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Time decay for the hot score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotDecay {
    pub half_life_hours: f64,
}

impl Default for HotDecay {
    fn default() -> Self {
        Self {
            half_life_hours: DEFAULT_HOT_HALF_LIFE_HOURS,
        }
    }
}

impl HotDecay {
    /// Decay multiplier in (0, 1]; future timestamps count as age zero
    pub fn factor(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_secs = (now - created_at).num_seconds().max(0) as f64;
        let age_hours = age_secs / 3600.0;
        0.5_f64.powf(age_hours / self.half_life_hours)
    }

    pub fn hot_score(&self, record: &ContentRecord, now: DateTime<Utc>) -> f64 {
        let engagement = if record.bull_score.is_finite() {
            record.bull_score.max(SCORE_FLOOR)
        } else {
            SCORE_FLOOR
        };
        (engagement + 1.0) * self.factor(record.created_or_min(), now)
    }
}

/// Bull score with the default weights
pub fn calculate_bull_score(
    view_count: u64,
    reactions: &ReactionCounts,
    comment_count: u64,
    reserved: f64,
) -> f64 {
    ScoringWeights::default().bull_score(view_count, reactions, comment_count, reserved)
}

/// Hot score with the default half-life. `now` is always explicit.
pub fn calculate_hot_score(record: &ContentRecord, now: DateTime<Utc>) -> f64 {
    HotDecay::default().hot_score(record, now)
}
