use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Rental-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Location search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Site root; search pages, next-page targets and listing hrefs resolve against it
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Location queries, crawled in the given order
    pub keywords: Vec<String>,
}

/// Browser session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Upper bound for a page navigation (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Upper bound for the result list or title to render (milliseconds)
    #[serde(rename = "render-timeout-ms", default = "default_render_timeout")]
    pub render_timeout_ms: u64,

    /// Upper bound for an optional listing section to appear (milliseconds)
    #[serde(rename = "section-timeout-ms", default = "default_section_timeout")]
    pub section_timeout_ms: u64,

    /// Pause after a result page renders, before links are harvested (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Number of scroll steps applied to a listing before extraction
    #[serde(rename = "scroll-steps", default = "default_scroll_steps")]
    pub scroll_steps: u32,

    /// Vertical distance per scroll step (pixels)
    #[serde(rename = "scroll-amount", default = "default_scroll_amount")]
    pub scroll_amount: i64,

    /// Pause after each scroll step (milliseconds)
    #[serde(rename = "scroll-wait-ms", default = "default_scroll_wait")]
    pub scroll_wait_ms: u64,
}

/// Crawl-phase configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of browser sessions crawling keywords in parallel
    #[serde(default = "default_sessions")]
    pub sessions: u32,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the plain-text URL list handed from crawl to scrape
    #[serde(rename = "urls-path")]
    pub urls_path: String,

    /// Path of the JSON record document
    #[serde(rename = "records-path")]
    pub records_path: String,
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn section_timeout(&self) -> Duration {
        Duration::from_millis(self.section_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn scroll_wait(&self) -> Duration {
        Duration::from_millis(self.scroll_wait_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            navigation_timeout_ms: default_navigation_timeout(),
            render_timeout_ms: default_render_timeout(),
            section_timeout_ms: default_section_timeout(),
            settle_delay_ms: default_settle_delay(),
            scroll_steps: default_scroll_steps(),
            scroll_amount: default_scroll_amount(),
            scroll_wait_ms: default_scroll_wait(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            sessions: default_sessions(),
        }
    }
}

fn default_headless() -> bool {
    true
}

fn default_navigation_timeout() -> u64 {
    150_000
}

fn default_render_timeout() -> u64 {
    10_000
}

fn default_section_timeout() -> u64 {
    3_000
}

fn default_settle_delay() -> u64 {
    6_500
}

fn default_scroll_steps() -> u32 {
    5
}

fn default_scroll_amount() -> i64 {
    15_000
}

fn default_scroll_wait() -> u64 {
    3_000
}

fn default_sessions() -> u32 {
    1
}
