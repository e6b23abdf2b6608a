//! Emote Sniper: an incremental catalog crawler
//!
//! This crate walks the paginated item catalog across several query
//! configurations, keeps a deduplicated record of every emote it has ever
//! seen, and rewrites a flat JSON snapshot at the end of each run.

pub mod config;
pub mod crawler;
pub mod output;
pub mod resolver;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Emote Sniper operations
#[derive(Debug, Error)]
pub enum SniperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No live catalog endpoint (tried {tried})")]
    NoLiveEndpoint { tried: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Emote Sniper operations
pub type Result<T> = std::result::Result<T, SniperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Coordinator};
pub use state::{CatalogRecord, RunState, RunStats};
pub use storage::{JsonStorage, Snapshot, Storage};
