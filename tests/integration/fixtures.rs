//! Synthetic site pages served through `SnapshotView`

use rental_harvest::config::{BrowserConfig, Config, CrawlerConfig, OutputConfig, SearchConfig};
use rental_harvest::gateway::SnapshotView;

pub const BASE: &str = "https://www.airbnb.com";

pub fn config(keywords: &[&str], sessions: u32, urls_path: &str, records_path: &str) -> Config {
    Config {
        search: SearchConfig {
            base_url: BASE.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        },
        browser: BrowserConfig {
            scroll_steps: 2,
            ..BrowserConfig::default()
        },
        crawler: CrawlerConfig { sessions },
        output: OutputConfig {
            urls_path: urls_path.to_string(),
            records_path: records_path.to_string(),
        },
    }
}

pub fn room_url(id: u32) -> String {
    format!("{}/rooms/{}", BASE, id)
}

/// A search result page listing `rooms`, optionally linking to a next page
pub fn result_page(page: u32, rooms: &[u32], next: Option<&str>) -> String {
    let cards: String = rooms
        .iter()
        .map(|id| {
            format!(
                r#"<div itemprop="itemListElement"><a aria-labelledby="title_{id}" href="/rooms/{id}?source_impression_id=p{page}">Room {id}</a></div>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a aria-label="Next" href="{}">Next</a>"#, href))
        .unwrap_or_default();

    format!(
        r#"<html><body><main>{cards}</main><nav><button aria-current="page">{page}</button>{next}</nav></body></html>"#
    )
}

/// Which regions a listing page renders
#[derive(Debug, Clone, Copy)]
pub struct Sections {
    pub title: bool,
    pub reviews: Reviews,
    pub odd_facility: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Reviews {
    Rated,
    Few,
    Empty,
    Missing,
}

impl Default for Sections {
    fn default() -> Self {
        Self {
            title: true,
            reviews: Reviews::Rated,
            odd_facility: false,
        }
    }
}

fn day(day: u32, disabled: bool, tabindex: i32) -> String {
    format!(
        r#"<td role="button" aria-disabled="{}" tabindex="{}">{}</td>"#,
        disabled, tabindex, day
    )
}

/// March: 1-10 booked, 11-20 disabled but focusable, 21-30 open.
/// April: 1-5 booked, the rest open.
fn calendar(id: u32) -> String {
    let march: String = (1..=30)
        .map(|d| match d {
            1..=10 => day(d, true, -1),
            11..=20 => day(d, true, 0),
            _ => day(d, false, 0),
        })
        .collect();
    let april: String = (1..=30).map(|d| day(d, d <= 5, if d <= 5 { -1 } else { 0 })).collect();

    format!(
        r#"<div data-section-id="AVAILABILITY_CALENDAR_INLINE" id="cal-{id}">
            <div aria-label="Calendar">
                <div data-visible="true"><h3>March 2024</h3><table><tbody><tr>{march}</tr></tbody></table></div>
                <div data-visible="true"><h3>April 2024</h3><table><tbody><tr>{april}</tr></tbody></table></div>
            </div>
        </div>"#
    )
}

fn listing_body(id: u32, sections: Sections, banner: &str) -> String {
    let mut body = String::new();

    if sections.title {
        body.push_str(&format!(
            r#"<div data-section-id="TITLE_DEFAULT"><section><h1>Desert Loft {id}</h1></section></div>"#
        ));
    }

    body.push_str(
        r#"<div data-section-id="LOCATION_DEFAULT"><section><h3>Henderson, Nevada, United States</h3></section></div>"#,
    );

    match sections.reviews {
        Reviews::Rated => body.push_str(
            r#"<div data-section-id="REVIEWS_DEFAULT">
                <h2><span>4.85 · 45 reviews</span></h2>
                <section><div><div><div>
                    <div><div><div><div>Cleanliness</div><div>4.9</div></div></div></div>
                    <div><div><div><div>Accuracy</div><div>4.8</div></div></div></div>
                    <div><div><div><div>Check-in</div><div>5.0</div></div></div></div>
                </div></div></div></section>
            </div>"#,
        ),
        Reviews::Few => body.push_str(
            r#"<div data-section-id="REVIEWS_DEFAULT"><h2><span>2 reviews</span></h2></div>"#,
        ),
        Reviews::Empty => body.push_str(
            r#"<div data-section-id="REVIEWS_EMPTY_DEFAULT"><h2>No reviews (yet)</h2></div>"#,
        ),
        Reviews::Missing => {}
    }

    let odd = if sections.odd_facility {
        "<li>· 1 private attached bath</li>"
    } else {
        ""
    };
    body.push_str(&format!(
        r#"<div data-section-id="OVERVIEW_DEFAULT"><ol><li>4 guests</li><li>· 2 bedrooms</li><li>· 2 beds</li><li>· 1.5 baths</li>{odd}</ol></div>"#
    ));

    body.push_str(
        r#"<div data-section-id="HOST_PROFILE_DEFAULT"><section>
            <a href="/users/show/4242">Host photo</a>
            <h2>Hosted by Dana</h2>
            <ul>
                <li>Identity verified</li>
                <li>Dana is a Superhost</li>
                <li>Response rate: 100%</li>
                <li>Response time: within an hour</li>
            </ul>
        </section></div>"#,
    );

    body.push_str(
        r#"<div data-section-id="BOOK_IT_SIDEBAR"><div><div><span><span>$215 per night</span></span></div></div></div>"#,
    );

    body.push_str(&calendar(id));
    body.push_str(banner);
    body.push_str(&format!(
        r#"<button id="photos-{id}"><span>Show all photos</span></button>"#
    ));

    body
}

/// Registers listing `id` plus the states reached by its calendar and
/// gallery clicks
pub fn add_listing(view: &mut SnapshotView, id: u32, sections: Sections) {
    let page = |banner: &str| {
        format!(
            "<html><body>{}</body></html>",
            listing_body(id, sections, banner)
        )
    };

    view.add_page(&room_url(id), page(""));
    view.on_click(
        &format!("#cal-{id} td[aria-disabled=false]"),
        page(r#"<div data-testid="availability-calendar-date-range">Minimum stay: 3 nights</div>"#),
    );
    view.on_click(
        &format!("#photos-{id}"),
        format!(
            r#"<html><body><div data-testid="photo-viewer-section">{}</div></body></html>"#,
            "<picture><img src=\"p.jpg\"></picture>".repeat(3 + id as usize % 2)
        ),
    );
}
