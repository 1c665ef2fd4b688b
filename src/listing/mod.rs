//! Listing scrape phase
//!
//! This module turns listing pages into flat records:
//! - Locating the named sections of a listing page
//! - Extracting typed fields section by section, isolating failures
//! - Counting booked calendar days and probing the minimum stay
//! - Assembling the record and driving the per-URL loop

pub mod calendar;
mod extract;
pub mod parse;
mod record;
mod section;

pub use calendar::{CalendarMonth, DayCell};
pub use extract::ExtractionEngine;
pub use record::{HostProfile, ListingRecord, RecordAssembler, ReviewDetail, SectionOutputs};
pub use section::{locate, Lookup, Presence, Section};

use crate::config::Config;
use crate::diagnostics::LogSink;
use crate::gateway::{DocumentView, GatewayError, SessionFactory};
use crate::HarvestError;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// A section-level failure; never escapes its section except when the
/// session itself is gone
#[derive(Debug, Clone, Error)]
pub enum SectionError {
    #[error("{0} section not found")]
    Absent(Section),

    #[error("{section} section is malformed: {reason}")]
    Malformed { section: Section, reason: String },

    #[error("could not parse {field}: {reason}")]
    Parse { field: &'static str, reason: String },

    #[error("{section} section: {source}")]
    Gateway {
        section: Section,
        source: GatewayError,
    },
}

impl SectionError {
    pub fn malformed(section: Section, reason: impl Into<String>) -> Self {
        Self::Malformed {
            section,
            reason: reason.into(),
        }
    }

    pub fn parse(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            field,
            reason: reason.into(),
        }
    }

    /// Adapter for `map_err` on gateway calls made inside `section`
    pub fn gateway(section: Section) -> impl Fn(GatewayError) -> Self {
        move |source| Self::Gateway { section, source }
    }

    /// The session failure behind this error, if any
    pub fn fatal_source(&self) -> Option<&GatewayError> {
        match self {
            Self::Gateway { source, .. } if source.is_fatal() => Some(source),
            _ => None,
        }
    }
}

/// A failure that drops the record for one URL
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    /// The title could not be read; the run moves on to the next URL
    #[error("No title for {url}: {reason}")]
    MissingTitle { url: String, reason: String },

    /// Navigation failed and the browser is not showing the listing
    #[error("{url} did not load: {reason}")]
    NotLoaded { url: String, reason: String },

    /// The session is unusable; the run stops
    #[error("Session failed while scraping {url}: {source}")]
    Session { url: String, source: GatewayError },
}

/// Records produced by a scrape run and the URLs that yielded none
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    pub records: Vec<ListingRecord>,
    pub dropped: Vec<String>,
    /// Set when the session died before every URL was visited
    pub aborted: Option<GatewayError>,
}

impl ScrapeOutcome {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Scrapes `urls` one at a time through a single session
///
/// A missing title or a page that never loaded drops that URL and the loop
/// continues. A session failure stops the loop; the records gathered so far
/// are kept and the failure is carried in [`ScrapeOutcome::aborted`].
pub fn scrape_listings<V: DocumentView>(
    engine: &ExtractionEngine,
    view: &mut V,
    urls: &[String],
    sink: &dyn LogSink,
) -> ScrapeOutcome {
    let mut outcome = ScrapeOutcome::default();

    for (index, url) in urls.iter().enumerate() {
        sink.debug(&format!("Scraping {}/{}: {}", index + 1, urls.len(), url));

        match engine.scrape(view, url) {
            Ok(record) => outcome.records.push(record),
            Err(RecordError::MissingTitle { url, reason })
            | Err(RecordError::NotLoaded { url, reason }) => {
                sink.error(&format!("Dropping {}: {}", url, reason));
                outcome.dropped.push(url);
            }
            Err(RecordError::Session { url, source }) => {
                sink.error(&format!(
                    "Session lost while scraping {} ({} of {} done): {}",
                    url,
                    index,
                    urls.len(),
                    source
                ));
                outcome.aborted = Some(source);
                break;
            }
        }
    }

    outcome
}

/// Runs the scrape phase on a blocking worker
///
/// Opens one session from `factory`; failure to open is fatal to the run.
/// A session lost later comes back inside the outcome with the partial
/// records.
pub async fn run_scrape<F: SessionFactory>(
    config: &Config,
    factory: F,
    urls: Vec<String>,
    sink: Arc<dyn LogSink>,
) -> Result<ScrapeOutcome, HarvestError> {
    let base_url = Url::parse(&config.search.base_url)?;
    let engine = ExtractionEngine::new(config.browser.clone(), base_url, sink.clone());

    tokio::task::spawn_blocking(move || {
        let mut view = factory.open().map_err(HarvestError::Session)?;
        sink.info(&format!("Scraping {} listings", urls.len()));
        Ok(scrape_listings(&engine, &mut view, &urls, sink.as_ref()))
    })
    .await?
}
