//! Section Locator
//!
//! Resolves the named content regions of a listing page. Every region is a
//! closed [`Section`] variant carrying its own selectors; lookups report an
//! explicit present, placeholder or absent result.

use crate::gateway::{DocumentView, GatewayResult};
use std::fmt;
use std::time::Duration;

/// A tagged region of a listing document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Title,
    Location,
    Reviews,
    Overview,
    HostProfile,
    BookIt,
    Calendar,
    Photos,
}

/// How much a section's absence matters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Absence drops the record
    Required,
    /// Absence is reported as a warning
    Expected,
    /// Absence is normal and silent
    Optional,
}

impl Section {
    /// Every section, in extraction order
    pub const ALL: [Section; 8] = [
        Section::Title,
        Section::Location,
        Section::Reviews,
        Section::Overview,
        Section::HostProfile,
        Section::BookIt,
        Section::Calendar,
        Section::Photos,
    ];

    /// Selector of the region's container
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Title => "div[data-section-id=TITLE_DEFAULT]",
            Self::Location => "div[data-section-id=LOCATION_DEFAULT]",
            Self::Reviews => "div[data-section-id=REVIEWS_DEFAULT]",
            Self::Overview => "div[data-section-id=OVERVIEW_DEFAULT]",
            Self::HostProfile => "div[data-section-id=HOST_PROFILE_DEFAULT]",
            Self::BookIt => "div[data-section-id=BOOK_IT_SIDEBAR]",
            Self::Calendar => "div[data-section-id=AVAILABILITY_CALENDAR_INLINE]",
            Self::Photos => "div[data-testid=photo-viewer-section]",
        }
    }

    /// Selector of an explicit "nothing here" variant of the region
    pub fn placeholder_selector(&self) -> Option<&'static str> {
        match self {
            Self::Reviews => Some("div[data-section-id=REVIEWS_EMPTY_DEFAULT]"),
            _ => None,
        }
    }

    pub fn presence(&self) -> Presence {
        match self {
            Self::Title => Presence::Required,
            Self::Photos => Presence::Optional,
            _ => Presence::Expected,
        }
    }

    /// Upper-case label used in log messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "TITLE",
            Self::Location => "LOCATION",
            Self::Reviews => "REVIEWS",
            Self::Overview => "OVERVIEW",
            Self::HostProfile => "HOST PROFILE",
            Self::BookIt => "BOOK IT",
            Self::Calendar => "CALENDAR",
            Self::Photos => "PHOTOS",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of locating a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<N> {
    /// The region is rendered
    Present(N),
    /// The region's explicit empty variant is rendered instead
    Placeholder(N),
    /// Neither is rendered
    Absent,
}

impl<N> Lookup<N> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The rendered region, if any
    pub fn present(self) -> Option<N> {
        match self {
            Self::Present(node) => Some(node),
            _ => None,
        }
    }
}

/// Finds `section` in the loaded document
///
/// An immediate match returns at once. Otherwise the locator waits up to
/// `wait` for the region to render before checking for the placeholder
/// variant. A wait timeout is an ordinary absence; only a fatal session
/// error escapes.
pub fn locate<V: DocumentView>(
    view: &mut V,
    section: Section,
    wait: Duration,
) -> GatewayResult<Lookup<V::Node>> {
    if let Some(node) = view.query_one(None, section.selector())? {
        return Ok(Lookup::Present(node));
    }

    if let Some(placeholder) = section.placeholder_selector() {
        if let Some(node) = view.query_one(None, placeholder)? {
            return Ok(Lookup::Placeholder(node));
        }
    }

    match view.wait_for(section.selector(), wait) {
        Ok(()) => {}
        Err(e) if e.is_fatal() => return Err(e),
        Err(_) => return Ok(Lookup::Absent),
    }

    Ok(view
        .query_one(None, section.selector())?
        .map(Lookup::Present)
        .unwrap_or(Lookup::Absent))
}
