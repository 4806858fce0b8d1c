//! Content Records
//!
//! The analysis shape shared by every ranking stage. Upstream rows are loosely
//! typed (missing keys, nulls, numbers as strings), so all defaulting happens
//! here, once, at decode time. Downstream code never re-checks a field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Maximum tickers kept per record
pub const MAX_TICKERS: usize = 5;

/// Tickers shown on a feed card
pub const DISPLAY_TICKERS: usize = 3;

/// Confidence assumed when the author left it blank
pub const DEFAULT_CONFIDENCE: u8 = 5;

const MAX_CONFIDENCE: u8 = 10;

/// Market an analysis belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Forex,
    Crypto,
    Stocks,
    Indices,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Forex => "forex",
            Market::Crypto => "crypto",
            Market::Stocks => "stocks",
            Market::Indices => "indices",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forex" => Ok(Market::Forex),
            "crypto" => Ok(Market::Crypto),
            "stocks" => Ok(Market::Stocks),
            "indices" => Ok(Market::Indices),
            _ => Err(Error::InvalidMarket {
                value: s.to_string(),
            }),
        }
    }
}

/// Directional call of the analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(Direction::Bullish),
            "bearish" => Ok(Direction::Bearish),
            "neutral" => Ok(Direction::Neutral),
            _ => Err(()),
        }
    }
}

/// Editorial format of the analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    DeepDive,
    MarketPulse,
    BlogPost,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::DeepDive => "deep_dive",
            ContentType::MarketPulse => "market_pulse",
            ContentType::BlogPost => "blog_post",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deep_dive" => Ok(ContentType::DeepDive),
            "market_pulse" => Ok(ContentType::MarketPulse),
            "blog_post" => Ok(ContentType::BlogPost),
            _ => Err(Error::InvalidContentType {
                value: s.to_string(),
            }),
        }
    }
}

/// Reaction counters. Every key is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    #[serde(default, deserialize_with = "lenient::count")]
    pub bull: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub bear: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub save: u64,
}

impl ReactionCounts {
    pub fn new(bull: u64, bear: u64, save: u64) -> Self {
        Self { bull, bear, save }
    }
}

/// Public profile of the analysis author
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorProfile {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_verified: bool,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_smart_money: bool,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub win_rate: Option<f64>,
}

impl AuthorProfile {
    /// Authors whose posts qualify for the smart money tab
    pub fn is_smart_money_author(&self) -> bool {
        self.is_smart_money || self.is_verified
    }
}

/// File or image attached to an analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub size: Option<u64>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.kind == "image" || self.kind.starts_with("image/")
    }
}

/// A user-submitted trading analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub market: Option<Market>,
    #[serde(default, deserialize_with = "lenient::parsed_or_default")]
    pub direction: Direction,
    #[serde(default, deserialize_with = "lenient::string")]
    pub pair: String,
    #[serde(default, deserialize_with = "lenient::tickers")]
    pub tickers: Vec<String>,
    #[serde(default, deserialize_with = "lenient::parsed_or_default")]
    pub content_type: ContentType,
    #[serde(default = "default_confidence", deserialize_with = "lenient::confidence")]
    pub confidence_score: u8,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_pro_only: bool,
    #[serde(default, deserialize_with = "lenient::opt_flag")]
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub reaction_counts: ReactionCounts,
    #[serde(default, deserialize_with = "lenient::count")]
    pub comment_count: u64,
    /// Derived. Overwritten by every ranking pass.
    #[serde(default, deserialize_with = "lenient::score")]
    pub bull_score: f64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub author: Option<AuthorProfile>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub attachments: Vec<Attachment>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub image_url: Option<String>,
}

fn default_confidence() -> u8 {
    DEFAULT_CONFIDENCE
}

impl ContentRecord {
    /// A published record with zero engagement
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: String::new(),
            market: None,
            direction: Direction::default(),
            pair: String::new(),
            tickers: Vec::new(),
            content_type: ContentType::default(),
            confidence_score: DEFAULT_CONFIDENCE,
            created_at: None,
            is_pro_only: false,
            is_published: Some(true),
            view_count: 0,
            reaction_counts: ReactionCounts::default(),
            comment_count: 0,
            bull_score: 0.0,
            author: None,
            attachments: Vec::new(),
            image_url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = pair.into();
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = Some(market);
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tickers = normalize_tickers(tickers.into_iter().map(Into::into));
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_engagement(mut self, view_count: u64, reactions: ReactionCounts, comment_count: u64) -> Self {
        self.view_count = view_count;
        self.reaction_counts = reactions;
        self.comment_count = comment_count;
        self
    }

    pub fn with_bull_score(mut self, bull_score: f64) -> Self {
        self.bull_score = bull_score;
        self
    }

    pub fn with_author(mut self, author: AuthorProfile) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_published(mut self, published: Option<bool>) -> Self {
        self.is_published = published;
        self
    }

    /// Only records explicitly marked published are ever shown
    pub fn is_visible(&self) -> bool {
        self.is_published == Some(true)
    }

    pub fn is_smart_money(&self) -> bool {
        self.author
            .as_ref()
            .map(AuthorProfile::is_smart_money_author)
            .unwrap_or(false)
    }

    /// Card image: explicit image url first, then the first image attachment
    pub fn preview_image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| {
                self.attachments
                    .iter()
                    .find(|a| a.is_image() && !a.url.is_empty())
                    .map(|a| a.url.as_str())
            })
    }

    pub fn display_tickers(&self) -> &[String] {
        &self.tickers[..self.tickers.len().min(DISPLAY_TICKERS)]
    }

    /// Case-insensitive match of an already lowercased needle
    pub(crate) fn matches_needle(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self.pair.to_lowercase().contains(needle)
            || self.tickers.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// Creation instant used for ordering. Unknown sorts as the oldest.
    pub(crate) fn created_or_min(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Trim, drop blanks, de-duplicate case-insensitively and cap at [`MAX_TICKERS`]
pub fn normalize_tickers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::with_capacity(MAX_TICKERS);
    for ticker in raw {
        let ticker = ticker.trim();
        if ticker.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(ticker)) {
            continue;
        }
        out.push(ticker.to_string());
        if out.len() == MAX_TICKERS {
            break;
        }
    }
    out
}

/// Field decoders that never fail on a present-but-odd value
mod lenient {
    use super::*;
    use serde::de::DeserializeOwned;

    fn value<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
        Option::<Value>::deserialize(d).map(Option::unwrap_or_default)
    }

    fn as_text(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match as_text(&value(d)?) {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(serde::de::Error::custom("record id must be a non-empty string or number")),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(as_text(&value(d)?).unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(as_text(&value(d)?))
    }

    pub fn parsed<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        Ok(as_text(&value(d)?).and_then(|s| s.parse().ok()))
    }

    pub fn parsed_or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Default,
    {
        parsed(d).map(Option::unwrap_or_default)
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(serde_json::from_value(value(d)?).unwrap_or_default())
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        opt_flag(d).map(|b| b.unwrap_or(false))
    }

    pub fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match value(d)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let v = value(d)?;
        let n = match &v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(n.filter(|n: &f64| n.is_finite()))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(opt_f64(d)?.map(|n| if n <= 0.0 { 0 } else { n as u64 }))
    }

    /// Non-negative integer counter; negatives and junk read as zero
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        opt_u64(d).map(Option::unwrap_or_default)
    }

    pub fn score<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_f64(d)?.unwrap_or(0.0).max(0.0))
    }

    pub fn confidence<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        Ok(match opt_f64(d)? {
            Some(n) => n.round().clamp(0.0, f64::from(MAX_CONFIDENCE)) as u8,
            None => DEFAULT_CONFIDENCE,
        })
    }

    pub fn tickers<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let raw: Vec<String> = match value(d)? {
            Value::Array(items) => items.iter().filter_map(as_text).collect(),
            Value::String(s) => s.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };
        Ok(normalize_tickers(raw))
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match value(d)? {
            Value::String(s) => parse_timestamp(&s),
            _ => None,
        })
    }
}

/// Parse RFC 3339, falling back to a zone-less timestamp read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
