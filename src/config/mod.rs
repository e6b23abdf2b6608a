//! Configuration module for Emote Sniper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to the built-in
//! catalog setup returned by [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use emote_sniper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sniper.toml")).unwrap();
//! println!("Scanning {} query configurations", config.queries.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, EndpointEntry, OutputConfig, QueryConfig, ResolverConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
