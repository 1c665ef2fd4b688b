use crate::config::types::{BrowserConfig, Config, CrawlerConfig, OutputConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on parallel crawl sessions
const MAX_SESSIONS: u32 = 16;

/// Upper bound on listing pre-scroll steps
const MAX_SCROLL_STEPS: u32 = 50;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_browser_config(&config.browser)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the search section: a usable base URL and at least one keyword
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "keywords must contain at least one location".to_string(),
        ));
    }

    if let Some(position) = config.keywords.iter().position(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "keyword #{} is blank",
            position + 1
        )));
    }

    Ok(())
}

/// Validates browser timing configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    let timeouts = [
        ("navigation-timeout-ms", config.navigation_timeout_ms),
        ("render-timeout-ms", config.render_timeout_ms),
        ("section-timeout-ms", config.section_timeout_ms),
    ];

    for (name, value) in timeouts {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }

    if config.scroll_steps > MAX_SCROLL_STEPS {
        return Err(ConfigError::Validation(format!(
            "scroll-steps must be <= {}, got {}",
            MAX_SCROLL_STEPS, config.scroll_steps
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.sessions < 1 || config.sessions > MAX_SESSIONS {
        return Err(ConfigError::Validation(format!(
            "sessions must be between 1 and {}, got {}",
            MAX_SESSIONS, config.sessions
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.urls_path.is_empty() {
        return Err(ConfigError::Validation(
            "urls-path cannot be empty".to_string(),
        ));
    }

    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records-path cannot be empty".to_string(),
        ));
    }

    if config.urls_path == config.records_path {
        return Err(ConfigError::Validation(
            "urls-path and records-path must differ".to_string(),
        ));
    }

    Ok(())
}
