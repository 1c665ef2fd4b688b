//! Rental-Harvest: a vacation-rental listing harvester
//!
//! This crate crawls a paginated location search to collect listing URLs,
//! then visits each listing through a rendered-document session and extracts
//! a flat record of price, ratings, facilities, host metadata, calendar
//! occupancy and photo count.

pub mod config;
pub mod crawler;
pub mod diagnostics;
pub mod gateway;
pub mod listing;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Rental-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session failed: {0}")]
    Session(gateway::GatewayError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
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

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Rental-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use diagnostics::{LogSink, MemorySink, TracingSink};
pub use gateway::{DocumentView, GatewayError};
pub use listing::{ListingRecord, RecordError, Section};
pub use url::{canonicalize_url, LinkSet};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvest_error_wraps_phase_failures() {
        let err: HarvestError = UrlError::MissingHost.into();
        assert!(matches!(err, HarvestError::UrlError(UrlError::MissingHost)));

        let err = HarvestError::Session(GatewayError::Session("browser exited".to_string()));
        assert_eq!(
            err.to_string(),
            "Browser session failed: Session unusable: browser exited"
        );
    }
}
