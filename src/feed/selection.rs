//! Feed Selection
//!
//! What the viewer asked for: which tab, which markets, which formats,
//! what search text and which page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::record::{ContentRecord, ContentType, Market};
use crate::error::{Error, Result};

/// Feed tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStrategy {
    Hot,
    Top,
    SmartMoney,
    #[default]
    Fresh,
}

impl FeedStrategy {
    pub const ALL: [FeedStrategy; 4] = [
        FeedStrategy::Hot,
        FeedStrategy::Top,
        FeedStrategy::SmartMoney,
        FeedStrategy::Fresh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStrategy::Hot => "hot",
            FeedStrategy::Top => "top",
            FeedStrategy::SmartMoney => "smart_money",
            FeedStrategy::Fresh => "fresh",
        }
    }

    /// Absent selector means the default tab; an unknown one is always an error
    pub fn parse_optional(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(s) => s.parse(),
        }
    }
}

impl fmt::Display for FeedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(FeedStrategy::Hot),
            "top" => Ok(FeedStrategy::Top),
            "smart_money" => Ok(FeedStrategy::SmartMoney),
            "fresh" => Ok(FeedStrategy::Fresh),
            _ => Err(Error::InvalidStrategy {
                value: s.to_string(),
            }),
        }
    }
}

/// Membership filter over an enum. An empty set means "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

pub type MarketFilter = Selection<Market>;
pub type ContentTypeFilter = Selection<ContentType>;

impl<T: Ord> Selection<T> {
    pub fn only<I: IntoIterator<Item = T>>(items: I) -> Self {
        Selection::Only(items.into_iter().collect())
    }

    pub fn is_all(&self) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.is_empty(),
        }
    }

    /// Values outside the enum (`None`) only pass an "all" filter
    pub fn admits(&self, value: Option<&T>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) if set.is_empty() => true,
            Selection::Only(set) => value.map(|v| set.contains(v)).unwrap_or(false),
        }
    }
}

impl<T> Selection<T>
where
    T: Ord + FromStr<Err = Error>,
{
    /// Parse a comma separated list; `all` anywhere in it selects everything
    pub fn parse_list(raw: &str) -> Result<Self> {
        Self::parse_items(raw.split(','))
    }

    pub fn parse_items<'a, I>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = BTreeSet::new();
        for item in items.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
            if item.eq_ignore_ascii_case("all") {
                return Ok(Selection::All);
            }
            set.insert(item.parse()?);
        }
        Ok(if set.is_empty() {
            Selection::All
        } else {
            Selection::Only(set)
        })
    }
}

/// Full feed request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedQuery {
    pub markets: MarketFilter,
    pub content_types: ContentTypeFilter,
    pub search: String,
    pub strategy: FeedStrategy,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl FeedQuery {
    pub fn new(strategy: FeedStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    pub fn with_markets(mut self, markets: MarketFilter) -> Self {
        self.markets = markets;
        self
    }

    pub fn with_content_types(mut self, content_types: ContentTypeFilter) -> Self {
        self.content_types = content_types;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_page(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Lowercased needle, padding kept; `None` when the query is blank
    pub(crate) fn search_needle(&self) -> Option<String> {
        if self.search.trim().is_empty() {
            None
        } else {
            Some(self.search.to_lowercase())
        }
    }

    /// Reject windows a pager could never advance through
    pub fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            return Err(Error::bad_request("limit must be at least 1"));
        }
        Ok(())
    }
}

/// Case-insensitive substring match over title, content, pair and tickers.
/// A blank query matches everything; otherwise surrounding spaces are part of it.
pub fn matches_search(record: &ContentRecord, query: &str) -> bool {
    query.trim().is_empty() || record.matches_needle(&query.to_lowercase())
}
