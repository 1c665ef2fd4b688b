//! Listing Record Assembler
//!
//! Collects every section's result, applies the null policy and logs each
//! degraded field once. The record serializes as one flat JSON object whose
//! key set depends on which sections matched.

use crate::diagnostics::LogSink;
use crate::listing::calendar::{render_occupancy, CalendarMonth};
use crate::listing::parse::{DailyRate, ReviewSummary, RATE_CURRENCY};
use crate::listing::{Presence, SectionError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Review header plus per-aspect ratings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewDetail {
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub sub_ratings: Vec<(String, f64)>,
}

impl ReviewDetail {
    /// The explicit "no reviews yet" state
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_summary(summary: ReviewSummary, sub_ratings: Vec<(String, f64)>) -> Self {
        Self {
            rating: summary.rating,
            reviews: summary.reviews,
            sub_ratings,
        }
    }
}

/// Host section fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostProfile {
    pub name: String,
    pub url: Option<String>,
    pub is_verified: bool,
    pub is_superhost: bool,
    /// Normalized `host_<key>` attributes in page order
    pub attributes: Vec<(String, String)>,
}

/// Per-section results handed to the assembler, in extraction order
#[derive(Debug, Clone)]
pub struct SectionOutputs {
    pub title: String,
    pub location: Result<String, SectionError>,
    pub reviews: Result<ReviewDetail, SectionError>,
    pub facilities: Result<Vec<(String, f64)>, SectionError>,
    pub host: Result<HostProfile, SectionError>,
    pub rate: Result<DailyRate, SectionError>,
    pub occupancy: Result<Vec<CalendarMonth>, SectionError>,
    pub minimum_stay: Result<u32, SectionError>,
    pub pictures: Result<u32, SectionError>,
}

/// One scraped listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub title: String,
    pub location: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub sub_ratings: Vec<(String, f64)>,
    pub daily_rate: Option<DailyRate>,
    pub currency: Option<String>,
    pub n_pictures: Option<u32>,
    pub occupancy: Vec<CalendarMonth>,
    pub days_booking_per_month: Option<String>,
    pub minimum_stay: Option<u32>,
    pub facilities: Vec<(String, f64)>,
    pub host: Option<HostProfile>,
    /// Canonical listing URL
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

impl ListingRecord {
    /// The record as a JSON object
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Whole-number values serialize as integers ("4 guests" gives `4`, not `4.0`)
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

impl Serialize for DailyRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DailyRate::Amount(amount) => number(*amount).serialize(serializer),
            DailyRate::Raw(text) => serializer.serialize_str(text),
        }
    }
}

impl Serialize for ListingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("location", &self.location)?;
        map.serialize_entry("rating", &self.rating)?;
        map.serialize_entry("reviews", &self.reviews)?;
        for (key, value) in &self.sub_ratings {
            map.serialize_entry(key, value)?;
        }

        map.serialize_entry("daily_rate", &self.daily_rate)?;
        map.serialize_entry("currency", &self.currency)?;
        map.serialize_entry("n_pictures", &self.n_pictures)?;
        map.serialize_entry("days_booking_per_month", &self.days_booking_per_month)?;
        map.serialize_entry("minimum_stay", &self.minimum_stay)?;

        for (key, value) in &self.facilities {
            map.serialize_entry(key, &number(*value))?;
        }

        let host = self.host.as_ref();
        map.serialize_entry("host_name", &host.map(|h| &h.name))?;
        map.serialize_entry("host_url", &host.and_then(|h| h.url.as_ref()))?;
        map.serialize_entry("is_verified", &host.map(|h| h.is_verified))?;
        map.serialize_entry("is_superhost", &host.map(|h| h.is_superhost))?;
        if let Some(host) = host {
            for (key, value) in &host.attributes {
                map.serialize_entry(key, value)?;
            }
        }

        map.serialize_entry("url", &self.url)?;
        map.serialize_entry(
            "scraped_at",
            &self.scraped_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        map.end()
    }
}

/// Merges section outputs into a [`ListingRecord`]
///
/// Every failed section degrades to null. Absence of an optional section
/// is logged at debug level; every other failure is logged as a warning
/// naming the listing URL.
pub struct RecordAssembler<'a> {
    sink: &'a dyn LogSink,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(sink: &'a dyn LogSink) -> Self {
        Self { sink }
    }

    pub fn assemble(&self, url: String, outputs: SectionOutputs) -> ListingRecord {
        let location = self.accept(&url, outputs.location);

        let reviews = self.accept(&url, outputs.reviews).unwrap_or_default();

        let facilities = self.accept(&url, outputs.facilities).unwrap_or_default();

        let host = self.accept(&url, outputs.host);

        let daily_rate = self.accept(&url, outputs.rate);
        let currency = daily_rate.as_ref().map(|_| RATE_CURRENCY.to_string());

        let occupancy = self.accept(&url, outputs.occupancy).unwrap_or_default();
        let days_booking_per_month = if occupancy.is_empty() {
            None
        } else {
            Some(render_occupancy(&occupancy))
        };

        let minimum_stay = self.accept(&url, outputs.minimum_stay);
        let n_pictures = self.accept(&url, outputs.pictures);

        ListingRecord {
            title: outputs.title,
            location,
            rating: reviews.rating,
            reviews: reviews.reviews,
            sub_ratings: reviews.sub_ratings,
            daily_rate,
            currency,
            n_pictures,
            occupancy,
            days_booking_per_month,
            minimum_stay,
            facilities,
            host,
            url,
            scraped_at: Utc::now(),
        }
    }

    fn accept<T>(&self, url: &str, result: Result<T, SectionError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(SectionError::Absent(section)) if section.presence() == Presence::Optional => {
                self.sink
                    .debug(&format!("{} section not present ({})", section, url));
                None
            }
            Err(e) => {
                self.sink.warn(&format!("{} ({})", e, url));
                None
            }
        }
    }
}
