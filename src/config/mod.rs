//! Configuration module for Rental-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use rental_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Keywords to crawl: {}", config.search.keywords.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserConfig, Config, CrawlerConfig, OutputConfig, SearchConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
