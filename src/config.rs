//! Configuration management for the Bull Feed engine
//!
//! Strongly-typed configuration read from environment variables, with
//! validation and sensible defaults.
//!
//! # Example
//! ```no_run
//! use bullfeed::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Page size: {}", config.feed.page_size);
//! ```

use crate::error::{Error, Result};
use crate::feed::scoring::{ScoringWeights, DEFAULT_HOT_HALF_LIFE_HOURS};
use crate::feed::selection::FeedStrategy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Default number of records per feed page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Main application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,
    /// Ranking configuration
    pub feed: FeedConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Maximum request body size
    pub max_body_size: usize,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024,
            cors_enabled: true,
        }
    }
}

/// Ranking configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Snapshot loaded at startup; empty feed when unset
    pub snapshot_path: Option<PathBuf>,
    /// Tab used when a request names none
    pub default_strategy: FeedStrategy,
    /// Page size when a request sets no limit
    pub page_size: usize,
    /// Hours for the hot score to halve
    pub hot_half_life_hours: f64,
    /// Engagement weights for `bull_score`
    pub weights: ScoringWeights,
    /// Order the smart money tab by top rated instead of input order
    pub smart_money_rank_top: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            default_strategy: FeedStrategy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            hot_half_life_hours: DEFAULT_HOT_HALF_LIFE_HOURS,
            weights: ScoringWeights::default(),
            smart_money_rank_top: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore if not found)
        dotenvy::dotenv().ok();

        let config = Self {
            api: ApiConfig::from_env()?,
            feed: FeedConfig::from_env()?,
        };

        config.validate()?;
        config.log_summary();

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let feed = &self.feed;

        if !(feed.hot_half_life_hours.is_finite() && feed.hot_half_life_hours > 0.0) {
            return Err(Error::InvalidConfig {
                key: "FEED_HOT_HALF_LIFE_HOURS",
                message: format!("must be positive, got {}", feed.hot_half_life_hours).into(),
            });
        }

        for (key, weight) in [
            ("FEED_WEIGHT_BULL", feed.weights.bull),
            ("FEED_WEIGHT_BEAR", feed.weights.bear),
            ("FEED_WEIGHT_SAVE", feed.weights.save),
            ("FEED_WEIGHT_VIEW", feed.weights.view),
            ("FEED_WEIGHT_COMMENT", feed.weights.comment),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidConfig {
                    key,
                    message: format!("weight must be a non-negative number, got {}", weight).into(),
                });
            }
        }

        if feed.page_size == 0 {
            return Err(Error::InvalidConfig {
                key: "FEED_PAGE_SIZE",
                message: "page size must be at least 1".into(),
            });
        }

        if self.api.max_body_size == 0 {
            return Err(Error::InvalidConfig {
                key: "API_MAX_BODY_SIZE",
                message: "max body size must be at least 1 byte".into(),
            });
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        let w = &self.feed.weights;
        info!("Configuration loaded:");
        info!("  API:");
        info!("    Listening on: {}:{}", self.api.host, self.api.port);
        info!("    Request timeout: {:?}", self.api.request_timeout);
        info!("    CORS: {}", self.api.cors_enabled);
        info!("  Feed:");
        match &self.feed.snapshot_path {
            Some(path) => info!("    Snapshot: {}", path.display()),
            None => info!("    Snapshot: none (starting empty)"),
        }
        info!("    Default strategy: {}", self.feed.default_strategy);
        info!("    Page size: {}", self.feed.page_size);
        info!("    Hot half-life: {}h", self.feed.hot_half_life_hours);
        info!(
            "    Weights: bull={} bear={} save={} view={} comment={}",
            w.bull, w.bear, w.save, w.view, w.comment
        );
        info!("    Smart money ranked by top: {}", self.feed.smart_money_rank_top);
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: get_env_parsed_or("API_PORT", defaults.port)?,
            host: get_env_or("API_HOST", &defaults.host),
            request_timeout: Duration::from_secs(get_env_parsed_or(
                "API_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            max_body_size: get_env_parsed_or("API_MAX_BODY_SIZE", defaults.max_body_size)?,
            cors_enabled: get_env_parsed_or("API_CORS_ENABLED", defaults.cors_enabled)?,
        })
    }
}

impl FeedConfig {
    fn from_env() -> Result<Self> {
        let defaults = ScoringWeights::default();

        let snapshot_path = std::env::var("FEED_SNAPSHOT_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            snapshot_path,
            default_strategy: get_env_parsed_or("FEED_DEFAULT_STRATEGY", FeedStrategy::default())?,
            page_size: get_env_parsed_or("FEED_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            hot_half_life_hours: get_env_parsed_or(
                "FEED_HOT_HALF_LIFE_HOURS",
                DEFAULT_HOT_HALF_LIFE_HOURS,
            )?,
            weights: ScoringWeights {
                bull: get_env_parsed_or("FEED_WEIGHT_BULL", defaults.bull)?,
                bear: get_env_parsed_or("FEED_WEIGHT_BEAR", defaults.bear)?,
                save: get_env_parsed_or("FEED_WEIGHT_SAVE", defaults.save)?,
                view: get_env_parsed_or("FEED_WEIGHT_VIEW", defaults.view)?,
                comment: get_env_parsed_or("FEED_WEIGHT_COMMENT", defaults.comment)?,
            },
            smart_money_rank_top: get_env_parsed_or("FEED_SMART_MONEY_RANK_TOP", false)?,
        })
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset
fn get_env_parsed_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => parse_value(key, &value),
        _ => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
        key,
        message: format!("Invalid value '{}': {}", value, e).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feed.page_size, 50);
        assert_eq!(config.feed.default_strategy, FeedStrategy::Fresh);
        assert_eq!(config.feed.hot_half_life_hours, 24.0);
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn test_rejects_bad_half_life() {
        let mut config = Config::default();
        config.feed.hot_half_life_hours = 0.0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig {
                key: "FEED_HOT_HALF_LIFE_HOURS",
                ..
            })
        ));

        config.feed.hot_half_life_hours = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_weight() {
        let mut config = Config::default();
        config.feed.weights.bear = -1.0;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig {
                key: "FEED_WEIGHT_BEAR",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let mut config = Config::default();
        config.feed.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<usize>("FEED_PAGE_SIZE", " 25 ").unwrap(), 25);
        assert_eq!(
            parse_value::<FeedStrategy>("FEED_DEFAULT_STRATEGY", "hot").unwrap(),
            FeedStrategy::Hot
        );
        assert!(matches!(
            parse_value::<f64>("FEED_WEIGHT_BULL", "lots"),
            Err(Error::InvalidConfig {
                key: "FEED_WEIGHT_BULL",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_api_and_flag_values_rejected() {
        assert!(matches!(
            parse_value::<u16>("API_PORT", "abc"),
            Err(Error::InvalidConfig { key: "API_PORT", .. })
        ));
        assert!(matches!(
            parse_value::<bool>("FEED_SMART_MONEY_RANK_TOP", "yes"),
            Err(Error::InvalidConfig {
                key: "FEED_SMART_MONEY_RANK_TOP",
                ..
            })
        ));
        assert!(parse_value::<bool>("API_CORS_ENABLED", "false").is_ok());
        assert_eq!(parse_value::<u16>("API_PORT", "9090").unwrap(), 9090);
    }

    #[test]
    fn test_unset_env_uses_default() {
        let value: usize = get_env_parsed_or("BULLFEED_TEST_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }
}
