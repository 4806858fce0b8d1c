//! Reactions
//!
//! Viewers react to an analysis with bull, bear or save. A reaction bumps the
//! matching counter and the record's `bull_score` is recomputed on the copy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::record::{ContentRecord, ReactionCounts};
use super::scoring::ScoringWeights;
use crate::error::Error;

/// Reaction kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionType {
    Bull,
    Bear,
    Save,
}

impl ReactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Bull => "bull",
            ReactionType::Bear => "bear",
            ReactionType::Save => "save",
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bull" => Ok(ReactionType::Bull),
            "bear" => Ok(ReactionType::Bear),
            "save" => Ok(ReactionType::Save),
            _ => Err(Error::InvalidReaction {
                value: s.to_string(),
            }),
        }
    }
}

impl ReactionCounts {
    pub fn get(&self, kind: ReactionType) -> u64 {
        match kind {
            ReactionType::Bull => self.bull,
            ReactionType::Bear => self.bear,
            ReactionType::Save => self.save,
        }
    }

    /// Saturating increment of one counter
    pub fn record(&mut self, kind: ReactionType) {
        let slot = match kind {
            ReactionType::Bull => &mut self.bull,
            ReactionType::Bear => &mut self.bear,
            ReactionType::Save => &mut self.save,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Copy of `record` with the reaction counted and the score refreshed
pub fn record_reaction(
    record: &ContentRecord,
    kind: ReactionType,
    weights: &ScoringWeights,
) -> ContentRecord {
    let mut updated = record.clone();
    updated.reaction_counts.record(kind);
    updated.bull_score = weights.score_record(&updated);

    metrics::counter!("bullfeed_reactions_total", "reaction" => kind.as_str()).increment(1);
    updated
}

/// Card highlight after a press: same reaction clears, another one switches
pub fn toggle_reaction(current: Option<ReactionType>, pressed: ReactionType) -> Option<ReactionType> {
    if current == Some(pressed) {
        None
    } else {
        Some(pressed)
    }
}
