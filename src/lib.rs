//! Bull Feed library crate
//!
//! Re-exports core modules for the binary, integration tests and external use.

pub mod api;
pub mod config;
pub mod error;
pub mod feed;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use feed::{ContentRecord, FeedEngine, FeedQuery, FeedStrategy};
