//! Field Extraction Engine
//!
//! Reads one listing page section by section. Each section produces its own
//! `Result`; a failure stays inside that section and the record assembler
//! decides the null/default. Only a page that never loaded, a missing title
//! or a dead session stops the record early.

use crate::config::BrowserConfig;
use crate::diagnostics::LogSink;
use crate::gateway::{find_by_text, text_of, DocumentView};
use crate::listing::calendar::{analyze_occupancy, probe_minimum_stay, CalendarMonth};
use crate::listing::parse::{
    classify_host_line, parse_facility, parse_host_name, parse_rate, parse_review_summary,
    parse_sub_rating, DailyRate, HostLine,
};
use crate::listing::record::{HostProfile, ListingRecord, RecordAssembler, ReviewDetail, SectionOutputs};
use crate::listing::section::{locate, Lookup, Section};
use crate::listing::{RecordError, SectionError};
use crate::url::{canonicalize_url, resolve_href};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const TITLE_HEADING: &str = "h1";
const LOCATION_HEADING: &str = "h3";
const LOCATION_BLOCKS: &str = "section > div";
const REVIEWS_HEADER: &str = "h2 > span";
const SUB_RATING_CONTAINER: &str = "section > div > div > div";
const SUB_RATING_ITEM: &str = "div > div > div";
const FACILITY_ITEM: &str = "ol > li";
const HOST_HEADER: &str = "h2";
const HOST_LINK: &str = "a[href]";
const HOST_DETAIL: &str = "ul > li";
const RATE_TEXT: &str = "div > div > span > span";
const PHOTO_TRIGGER: &str = "button";
const PHOTO_TRIGGER_TEXT: &str = "Show all photos";
const PICTURE: &str = "picture";

/// Extracts one [`ListingRecord`] per listing page
pub struct ExtractionEngine {
    browser: BrowserConfig,
    base_url: Url,
    sink: Arc<dyn LogSink>,
}

impl ExtractionEngine {
    pub fn new(browser: BrowserConfig, base_url: Url, sink: Arc<dyn LogSink>) -> Self {
        Self {
            browser,
            base_url,
            sink,
        }
    }

    /// Loads `url` and extracts its record
    ///
    /// A navigation timeout is logged and extraction proceeds on whatever
    /// rendered, provided the browser is on `url` at all. Otherwise the
    /// previous page is still showing and the URL is dropped.
    pub fn scrape<V: DocumentView>(
        &self,
        view: &mut V,
        url: &str,
    ) -> Result<ListingRecord, RecordError> {
        match view.navigate(url, self.browser.navigation_timeout()) {
            Ok(()) => self.sink.info(&format!("GET {}", url)),
            Err(e) if e.is_fatal() => {
                return Err(RecordError::Session {
                    url: url.to_string(),
                    source: e,
                })
            }
            Err(e) => {
                self.sink.warn(&format!("{} ({})", e, url));
                if !self.landed_on(view, url) {
                    return Err(RecordError::NotLoaded {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        for _ in 0..self.browser.scroll_steps {
            if let Err(e) = view.scroll(None, self.browser.scroll_amount, self.browser.scroll_wait()) {
                if e.is_fatal() {
                    return Err(RecordError::Session {
                        url: url.to_string(),
                        source: e,
                    });
                }
                self.sink.debug(&format!("Scroll failed: {} ({})", e, url));
                break;
            }
        }

        let outputs = self.extract(view, url)?;
        let canonical = view
            .current_url()
            .ok()
            .and_then(|current| canonicalize_url(&current).ok())
            .or_else(|| canonicalize_url(url).ok())
            .map(String::from)
            .unwrap_or_else(|| url.trim().to_string());

        Ok(RecordAssembler::new(self.sink.as_ref()).assemble(canonical, outputs))
    }

    fn landed_on<V: DocumentView>(&self, view: &V, url: &str) -> bool {
        let current = view
            .current_url()
            .ok()
            .and_then(|current| canonicalize_url(&current).ok());
        match (current, canonicalize_url(url).ok()) {
            (Some(current), Some(target)) => current == target,
            _ => false,
        }
    }

    /// Runs every section of the loaded page in extraction order
    pub fn extract<V: DocumentView>(
        &self,
        view: &mut V,
        url: &str,
    ) -> Result<SectionOutputs, RecordError> {
        let title = self.title(view).map_err(|e| match e.fatal_source() {
            Some(source) => RecordError::Session {
                url: url.to_string(),
                source: source.clone(),
            },
            None => RecordError::MissingTitle {
                url: url.to_string(),
                reason: e.to_string(),
            },
        })?;

        let location = escalate(url, self.location(view))?;
        let reviews = escalate(url, self.reviews(view, url))?;
        let facilities = escalate(url, self.facilities(view, url))?;
        let host = escalate(url, self.host(view))?;
        let rate = escalate(url, self.rate(view))?;
        let (occupancy, minimum_stay) = self.calendar(view);
        let occupancy = escalate(url, occupancy)?;
        let minimum_stay = escalate(url, minimum_stay)?;
        let pictures = escalate(url, self.pictures(view))?;

        Ok(SectionOutputs {
            title,
            location,
            reviews,
            facilities,
            host,
            rate,
            occupancy,
            minimum_stay,
            pictures,
        })
    }

    /// Resolves a section's node; placeholders count as absent
    fn section<V: DocumentView>(
        &self,
        view: &mut V,
        section: Section,
        wait: Duration,
    ) -> Result<V::Node, SectionError> {
        match locate(view, section, wait).map_err(SectionError::gateway(section))? {
            Lookup::Present(node) => Ok(node),
            Lookup::Placeholder(_) | Lookup::Absent => Err(SectionError::Absent(section)),
        }
    }

    fn title<V: DocumentView>(&self, view: &mut V) -> Result<String, SectionError> {
        let section = self.section(view, Section::Title, self.browser.render_timeout())?;
        text_of(view, Some(&section), TITLE_HEADING)
            .map_err(SectionError::gateway(Section::Title))?
            .filter(|title| !title.is_empty())
            .ok_or_else(|| SectionError::malformed(Section::Title, "no heading"))
    }

    /// Heading first, then the second address block
    fn location<V: DocumentView>(&self, view: &mut V) -> Result<String, SectionError> {
        let section = self.section(view, Section::Location, self.browser.section_timeout())?;
        let gateway = SectionError::gateway(Section::Location);

        if let Some(heading) = text_of(view, Some(&section), LOCATION_HEADING).map_err(&gateway)? {
            if !heading.is_empty() {
                return Ok(heading);
            }
        }

        let blocks = view
            .query_all(Some(&section), LOCATION_BLOCKS)
            .map_err(&gateway)?;
        if let Some(block) = blocks.get(1) {
            let text = view.text(block).map_err(&gateway)?.trim().to_string();
            if !text.is_empty() {
                return Ok(text);
            }
        }

        Err(SectionError::malformed(
            Section::Location,
            "neither heading nor address block",
        ))
    }

    fn reviews<V: DocumentView>(&self, view: &mut V, url: &str) -> Result<ReviewDetail, SectionError> {
        let section = match locate(view, Section::Reviews, self.browser.section_timeout())
            .map_err(SectionError::gateway(Section::Reviews))?
        {
            Lookup::Present(node) => node,
            Lookup::Placeholder(_) => return Ok(ReviewDetail::none()),
            Lookup::Absent => return Err(SectionError::Absent(Section::Reviews)),
        };
        let gateway = SectionError::gateway(Section::Reviews);

        let header = text_of(view, Some(&section), REVIEWS_HEADER)
            .map_err(&gateway)?
            .ok_or_else(|| SectionError::malformed(Section::Reviews, "no rating header"))?;
        let summary = parse_review_summary(&header)?;

        if summary.rating.is_none() {
            if summary.rating_expected() {
                self.sink.warn(&format!(
                    "No rating in REVIEWS header '{}' ({})",
                    header, url
                ));
            }
            return Ok(ReviewDetail::from_summary(summary, Vec::new()));
        }

        let mut sub_ratings: Vec<(String, f64)> = Vec::new();
        if let Some(container) = view
            .query_one(Some(&section), SUB_RATING_CONTAINER)
            .map_err(&gateway)?
        {
            for item in view
                .query_all(Some(&container), SUB_RATING_ITEM)
                .map_err(&gateway)?
            {
                let text = view.text(&item).map_err(&gateway)?;
                if let Some((key, value)) = parse_sub_rating(&text) {
                    upsert(&mut sub_ratings, key, value);
                }
            }
        }

        Ok(ReviewDetail::from_summary(summary, sub_ratings))
    }

    fn facilities<V: DocumentView>(
        &self,
        view: &mut V,
        url: &str,
    ) -> Result<Vec<(String, f64)>, SectionError> {
        let section = self.section(view, Section::Overview, self.browser.section_timeout())?;
        let gateway = SectionError::gateway(Section::Overview);

        let items = view
            .query_all(Some(&section), FACILITY_ITEM)
            .map_err(&gateway)?;
        if items.is_empty() {
            return Err(SectionError::malformed(Section::Overview, "no facility list"));
        }

        let mut facilities = Vec::new();
        for item in &items {
            let text = view.text(item).map_err(&gateway)?;
            match parse_facility(&text) {
                Some((key, value)) => upsert(&mut facilities, key, value),
                None => self.sink.warn(&format!(
                    "Main facilities have different format: '{}' ({})",
                    text.trim(),
                    url
                )),
            }
        }

        Ok(facilities)
    }

    fn host<V: DocumentView>(&self, view: &mut V) -> Result<HostProfile, SectionError> {
        let section = self.section(view, Section::HostProfile, self.browser.section_timeout())?;
        let gateway = SectionError::gateway(Section::HostProfile);

        let name = text_of(view, Some(&section), HOST_HEADER)
            .map_err(&gateway)?
            .and_then(|header| parse_host_name(&header))
            .ok_or_else(|| SectionError::malformed(Section::HostProfile, "no host name"))?;

        let url = match view.query_one(Some(&section), HOST_LINK).map_err(&gateway)? {
            Some(link) => view
                .attribute(&link, "href")
                .map_err(&gateway)?
                .and_then(|href| resolve_href(&self.base_url, &href).ok())
                .map(String::from),
            None => None,
        };

        let mut profile = HostProfile {
            name,
            url,
            ..HostProfile::default()
        };

        for item in view.query_all(Some(&section), HOST_DETAIL).map_err(&gateway)? {
            let text = view.text(&item).map_err(&gateway)?;
            for line in text.lines() {
                match classify_host_line(line) {
                    HostLine::Attribute { key, value } => upsert(&mut profile.attributes, key, value),
                    HostLine::Verified => profile.is_verified = true,
                    HostLine::Superhost => profile.is_superhost = true,
                    HostLine::Other => {}
                }
            }
        }

        Ok(profile)
    }

    fn rate<V: DocumentView>(&self, view: &mut V) -> Result<DailyRate, SectionError> {
        let section = self.section(view, Section::BookIt, self.browser.section_timeout())?;
        let text = text_of(view, Some(&section), RATE_TEXT)
            .map_err(SectionError::gateway(Section::BookIt))?
            .ok_or_else(|| SectionError::malformed(Section::BookIt, "no rate text"))?;
        parse_rate(&text)
    }

    /// Occupancy is read before the prober clicks a day, which re-renders the grid
    fn calendar<V: DocumentView>(
        &self,
        view: &mut V,
    ) -> (
        Result<Vec<CalendarMonth>, SectionError>,
        Result<u32, SectionError>,
    ) {
        let calendar = match self.section(view, Section::Calendar, self.browser.section_timeout()) {
            Ok(node) => node,
            Err(e) => return (Err(e.clone()), Err(e)),
        };

        let occupancy = analyze_occupancy(view, &calendar);
        let minimum_stay = probe_minimum_stay(view, &calendar, self.browser.section_timeout());
        (occupancy, minimum_stay)
    }

    /// Opens the gallery, scrolls it so lazy images render, counts pictures
    fn pictures<V: DocumentView>(&self, view: &mut V) -> Result<u32, SectionError> {
        let gateway = SectionError::gateway(Section::Photos);

        let trigger = find_by_text(view, None, PHOTO_TRIGGER, PHOTO_TRIGGER_TEXT)
            .map_err(&gateway)?
            .ok_or_else(|| SectionError::malformed(Section::Photos, "no gallery control"))?;
        view.click(&trigger).map_err(&gateway)?;

        let gallery = self.section(view, Section::Photos, self.browser.render_timeout())?;
        for _ in 0..self.browser.scroll_steps.max(1) {
            view.scroll(Some(&gallery), self.browser.scroll_amount, self.browser.scroll_wait())
                .map_err(&gateway)?;
        }

        let pictures = view.query_all(Some(&gallery), PICTURE).map_err(&gateway)?;
        Ok(pictures.len() as u32)
    }
}

/// Lifts a fatal session error out of a section result
fn escalate<T>(
    url: &str,
    result: Result<T, SectionError>,
) -> Result<Result<T, SectionError>, RecordError> {
    if let Err(e) = &result {
        if let Some(source) = e.fatal_source() {
            return Err(RecordError::Session {
                url: url.to_string(),
                source: source.clone(),
            });
        }
    }
    Ok(result)
}

/// Replaces the value of an existing key, otherwise appends
fn upsert<T>(entries: &mut Vec<(String, T)>, key: String, value: T) {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}
