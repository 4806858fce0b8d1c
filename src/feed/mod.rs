//! Feed Module
//!
//! Ranks user-submitted trading analyses for the Bull Feed.
//!
//! ## Architecture
//!
//! 1. **Record** - Loosely typed upstream rows decoded into [`ContentRecord`]
//! 2. **Scoring** - `bull_score` from engagement counters, hot decay by age
//! 3. **Strategies** - Hot, top rated, smart money and fresh orderings
//! 4. **Selection** - Viewer filters (market, content type, search, tab, page)
//! 5. **Engine** - The facade applying all of the above in a fixed order
//! 6. **Snapshot** - The record set one ranking pass works over
//!
//! ## Scoring
//!
//! ```text
//! bull_score = max(0, 2*bull + 3*save + comments + ln(1 + views) - 0.5*bear)
//! hot_score  = (bull_score + 1) * 0.5^(age_hours / 24)
//! ```
//!
//! Saves outweigh bulls, views are log-damped and bears only subtract a
//! little. Weights and the half-life are configurable.

pub mod engine;
pub mod metrics;
pub mod reactions;
pub mod record;
pub mod scoring;
pub mod selection;
pub mod snapshot;
pub mod strategies;

pub use engine::{select_feed, FeedEngine, FeedPage};
pub use reactions::{record_reaction, toggle_reaction, ReactionType};
pub use record::{
    Attachment, AuthorProfile, ContentRecord, ContentType, Direction, Market, ReactionCounts,
};
pub use scoring::{calculate_bull_score, calculate_hot_score, HotDecay, ScoringWeights};
pub use selection::{
    matches_search, ContentTypeFilter, FeedQuery, FeedStrategy, MarketFilter, Selection,
};
pub use snapshot::{Snapshot, SnapshotStore};
pub use strategies::{filter_smart_money, sort_by_fresh, sort_by_hot, sort_by_top_rated};
