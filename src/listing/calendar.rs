//! Calendar Occupancy Analyzer and Minimum-Stay Prober
//!
//! Both walk the inline availability calendar: visible month blocks, each
//! with a heading and a grid of day cells. The analyzer only reads; the
//! prober clicks a day, which re-renders the grid, so occupancy must be
//! counted first.

use crate::gateway::{DocumentView, GatewayResult};
use crate::listing::parse::parse_minimum_stay;
use crate::listing::{Section, SectionError};
use std::fmt;
use std::time::Duration;

const MONTH_GRID: &str = "div[aria-label=Calendar]";
const VISIBLE_MONTH: &str = "div[data-visible=true]";
const MONTH_LABEL: &str = "h3";
const DAY_CELL: &str = "td[role=button]";
const RANGE_SUMMARY: &str = "div[data-testid=availability-calendar-date-range]";

/// Interaction state of one day cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    /// `aria-disabled="true"`
    pub disabled: bool,
    /// Parsed `tabindex`, if set
    pub tabindex: Option<i32>,
}

impl DayCell {
    /// Reads a cell's state from its attributes
    pub fn read<V: DocumentView>(view: &V, node: &V::Node) -> GatewayResult<Self> {
        let disabled = view
            .attribute(node, "aria-disabled")?
            .map(|value| value.trim() == "true")
            .unwrap_or(false);
        let tabindex = view
            .attribute(node, "tabindex")?
            .and_then(|value| value.trim().parse::<i32>().ok());
        Ok(Self { disabled, tabindex })
    }

    /// Explicitly removed from keyboard focus order
    pub fn is_unfocusable(&self) -> bool {
        matches!(self.tabindex, Some(index) if index < 0)
    }

    /// Booked days are disabled and unfocusable; disabled but focusable
    /// cells are structural (past or trailing days) and do not count
    pub fn is_booked(&self) -> bool {
        self.disabled && self.is_unfocusable()
    }

    pub fn is_selectable(&self) -> bool {
        !self.disabled
    }
}

/// Booked-day count for one visible month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    pub label: String,
    pub booked: u32,
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.label, self.booked)
    }
}

/// Number of booked cells in a month grid
pub fn count_booked(cells: &[DayCell]) -> u32 {
    cells.iter().filter(|cell| cell.is_booked()).count() as u32
}

/// Renders months as "label = count" joined by ", ", in visible order
pub fn render_occupancy(months: &[CalendarMonth]) -> String {
    months
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Counts booked days for every visible month of the calendar section
pub fn analyze_occupancy<V: DocumentView>(
    view: &V,
    calendar: &V::Node,
) -> Result<Vec<CalendarMonth>, SectionError> {
    let grid = view
        .query_one(Some(calendar), MONTH_GRID)
        .map_err(SectionError::gateway(Section::Calendar))?
        .ok_or_else(|| SectionError::malformed(Section::Calendar, "no month grid"))?;

    let blocks = view
        .query_all(Some(&grid), VISIBLE_MONTH)
        .map_err(SectionError::gateway(Section::Calendar))?;
    if blocks.is_empty() {
        return Err(SectionError::malformed(Section::Calendar, "no visible months"));
    }

    let mut months = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let label = view
            .query_one(Some(block), MONTH_LABEL)
            .and_then(|heading| match heading {
                Some(node) => view.text(&node).map(|text| text.trim().to_string()),
                None => Ok(String::new()),
            })
            .map_err(SectionError::gateway(Section::Calendar))?;
        if label.is_empty() {
            return Err(SectionError::malformed(
                Section::Calendar,
                format!("month #{} has no heading", months.len() + 1),
            ));
        }

        let cells = view
            .query_all(Some(block), DAY_CELL)
            .and_then(|nodes| {
                nodes
                    .iter()
                    .map(|node| DayCell::read(view, node))
                    .collect::<GatewayResult<Vec<_>>>()
            })
            .map_err(SectionError::gateway(Section::Calendar))?;

        months.push(CalendarMonth {
            label,
            booked: count_booked(&cells),
        });
    }

    Ok(months)
}

/// Selects the first available day and reads the minimum stay it reports
///
/// Cells are scanned across the visible months in document order. At most
/// one cell is clicked. The range summary must read "label: N nights".
pub fn probe_minimum_stay<V: DocumentView>(
    view: &mut V,
    calendar: &V::Node,
    timeout: Duration,
) -> Result<u32, SectionError> {
    let selector = format!("{} {} {}", MONTH_GRID, VISIBLE_MONTH, DAY_CELL);
    let nodes = view
        .query_all(Some(calendar), &selector)
        .map_err(SectionError::gateway(Section::Calendar))?;

    let mut target = None;
    for node in nodes {
        let cell = DayCell::read(view, &node).map_err(SectionError::gateway(Section::Calendar))?;
        if cell.is_selectable() {
            target = Some(node);
            break;
        }
    }
    let target = target
        .ok_or_else(|| SectionError::parse("minimum_stay", "no available day to select"))?;

    view.click(&target)
        .map_err(SectionError::gateway(Section::Calendar))?;
    view.wait_for(RANGE_SUMMARY, timeout)
        .map_err(SectionError::gateway(Section::Calendar))?;

    let summary = view
        .query_one(None, RANGE_SUMMARY)
        .and_then(|node| match node {
            Some(node) => view.text(&node).map(Some),
            None => Ok(None),
        })
        .map_err(SectionError::gateway(Section::Calendar))?
        .ok_or_else(|| SectionError::malformed(Section::Calendar, "range summary vanished"))?;

    parse_minimum_stay(&summary).ok_or_else(|| {
        SectionError::parse(
            "minimum_stay",
            format!("unexpected range summary '{}'", summary.replace('\n', " / ")),
        )
    })
}
