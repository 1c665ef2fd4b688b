//! Text rules for listing fields
//!
//! Pure functions turning the raw text of a section into typed values. The
//! extraction engine reads text through the gateway and hands it here, so
//! every rule can be exercised without a rendered document.

use crate::listing::SectionError;
use regex::Regex;
use std::sync::OnceLock;

/// Review counts at or below this are shown without an average rating
pub const RATING_VISIBILITY_THRESHOLD: u32 = 3;

/// Currency assigned to every parsed rate
pub const RATE_CURRENCY: &str = "USD";

const HOST_NAME_PREFIX: &str = "Hosted by";
const IDENTITY_VERIFIED: &str = "Identity verified";
const SUPERHOST: &str = "Superhost";
const MIDDLE_DOT: char = '\u{00b7}';

fn rating_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d\.\d{1,2}").expect("valid rating pattern"))
}

fn review_count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d[\d,]*)\s+reviews?").expect("valid review count pattern")
    })
}

fn minimum_stay_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[^:]+:\s*(\d+)\s+nights?$").expect("valid minimum stay pattern")
    })
}

/// Average rating and review count from the reviews header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewSummary {
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
}

impl ReviewSummary {
    /// True when the count is high enough that a rating should have been shown
    pub fn rating_expected(&self) -> bool {
        self.reviews
            .map(|count| count > RATING_VISIBILITY_THRESHOLD)
            .unwrap_or(false)
    }
}

/// Parses a combined "rating · N reviews" header
///
/// The review count is required. A rating is only read when the count is
/// above [`RATING_VISIBILITY_THRESHOLD`]; at or below it the site hides the
/// average, so `rating` is `None`.
///
/// # Examples
///
/// ```
/// use rental_harvest::listing::parse::parse_review_summary;
///
/// let summary = parse_review_summary("4.85 · 45 reviews").unwrap();
/// assert_eq!(summary.rating, Some(4.85));
/// assert_eq!(summary.reviews, Some(45));
///
/// let summary = parse_review_summary("2 reviews").unwrap();
/// assert_eq!(summary.rating, None);
/// assert_eq!(summary.reviews, Some(2));
/// ```
pub fn parse_review_summary(text: &str) -> Result<ReviewSummary, SectionError> {
    let reviews = review_count_pattern()
        .captures(text)
        .and_then(|captures| captures[1].replace(',', "").parse::<u32>().ok())
        .ok_or_else(|| SectionError::parse("reviews", format!("no review count in '{}'", text)))?;

    if reviews <= RATING_VISIBILITY_THRESHOLD {
        return Ok(ReviewSummary {
            rating: None,
            reviews: Some(reviews),
        });
    }

    let rating = rating_pattern()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok());

    Ok(ReviewSummary {
        rating,
        reviews: Some(reviews),
    })
}

/// Parses one "label / value" aspect rating block
///
/// The block must render as exactly two lines, the second numeric. The key
/// is the label lower-cased, whitespace joined by `_`, prefixed `rating_`.
pub fn parse_sub_rating(text: &str) -> Option<(String, f64)> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != 2 {
        return None;
    }

    let value = lines[1].parse::<f64>().ok()?;
    let label = lines[0]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();

    Some((format!("rating_{}", label), value))
}

/// Parses one overview entry such as "4 guests" or "· 2 bedrooms"
///
/// Two tokens give the singularized unit as key and the number as value.
/// A lone "Studio" gives `studio = 1`. Any other shape is unrecognized.
pub fn parse_facility(entry: &str) -> Option<(String, f64)> {
    let cleaned = entry.replace(MIDDLE_DOT, " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    match tokens.as_slice() {
        [count, unit] => {
            let value = count.replace(',', "").parse::<f64>().ok()?;
            Some((singularize(&unit.to_lowercase()), value))
        }
        [single] if single.eq_ignore_ascii_case("studio") => Some(("studio".to_string(), 1.0)),
        _ => None,
    }
}

/// Drops one trailing plural `s`
fn singularize(word: &str) -> String {
    word.strip_suffix('s').unwrap_or(word).to_string()
}

/// Host name from the host section header
pub fn parse_host_name(header: &str) -> Option<String> {
    let name = header.replacen(HOST_NAME_PREFIX, "", 1).trim().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// What one line of the host attribute list says
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostLine {
    /// "Response rate: 100%" becomes `host_response_rate = "100%"`
    Attribute { key: String, value: String },
    Verified,
    Superhost,
    Other,
}

pub fn classify_host_line(line: &str) -> HostLine {
    let line = line.trim();

    if let Some((label, value)) = line.split_once(':') {
        let key = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        if !key.is_empty() {
            return HostLine::Attribute {
                key: format!("host_{}", key),
                value: value.trim().to_string(),
            };
        }
    }

    if line == IDENTITY_VERIFIED {
        HostLine::Verified
    } else if line.contains(SUPERHOST) {
        HostLine::Superhost
    } else {
        HostLine::Other
    }
}

/// Nightly rate as read from the booking sidebar
#[derive(Debug, Clone, PartialEq)]
pub enum DailyRate {
    Amount(f64),
    /// Text that did not split into "amount per unit", kept verbatim
    Raw(String),
}

/// Parses rate text such as "$120 per night"
///
/// Text splitting into exactly two parts on the word "per" yields a numeric
/// amount with currency symbols and thousands separators removed. Any other
/// shape is kept verbatim as [`DailyRate::Raw`].
pub fn parse_rate(text: &str) -> Result<DailyRate, SectionError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let splits: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| **token == "per")
        .map(|(index, _)| index)
        .collect();

    if splits.len() != 1 {
        return Ok(DailyRate::Raw(text.trim().to_string()));
    }

    let amount = tokens[..splits[0]].join("");
    let amount = amount
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .replace(',', "");

    amount
        .parse::<f64>()
        .map(DailyRate::Amount)
        .map_err(|_| SectionError::parse("daily_rate", format!("'{}' is not an amount", text.trim())))
}

/// Night count from a "label: N nights" range summary
///
/// Each line is tried in turn; the first matching line wins.
pub fn parse_minimum_stay(text: &str) -> Option<u32> {
    text.lines().map(str::trim).find_map(|line| {
        minimum_stay_pattern()
            .captures(line)
            .and_then(|captures| captures[1].parse::<u32>().ok())
    })
}
