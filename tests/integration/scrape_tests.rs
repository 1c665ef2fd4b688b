//! Integration tests for the scrape phase

use crate::fixtures::{add_listing, config, room_url, Reviews, Sections, BASE};
use rental_harvest::config::BrowserConfig;
use rental_harvest::diagnostics::MemorySink;
use rental_harvest::gateway::{
    DocumentView, GatewayError, GatewayResult, SessionFactory, SnapshotNode, SnapshotView,
};
use rental_harvest::listing::{run_scrape, scrape_listings, ExtractionEngine};
use rental_harvest::output::write_records;
use rental_harvest::HarvestError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

fn engine(sink: Arc<MemorySink>) -> ExtractionEngine {
    let browser = BrowserConfig {
        scroll_steps: 2,
        ..BrowserConfig::default()
    };
    ExtractionEngine::new(browser, Url::parse(BASE).unwrap(), sink)
}

/// Serves pages until `dies_at` is requested, then reports a dead browser
struct DyingView {
    inner: SnapshotView,
    dies_at: String,
}

impl DocumentView for DyingView {
    type Node = SnapshotNode;

    fn navigate(&mut self, url: &str, timeout: Duration) -> GatewayResult<()> {
        if url == self.dies_at {
            return Err(GatewayError::Session("browser process exited".to_string()));
        }
        self.inner.navigate(url, timeout)
    }

    fn current_url(&self) -> GatewayResult<String> {
        self.inner.current_url()
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> GatewayResult<()> {
        self.inner.wait_for(selector, timeout)
    }

    fn pause(&mut self, duration: Duration) {
        self.inner.pause(duration)
    }

    fn query_one(
        &self,
        scope: Option<&SnapshotNode>,
        selector: &str,
    ) -> GatewayResult<Option<SnapshotNode>> {
        self.inner.query_one(scope, selector)
    }

    fn query_all(
        &self,
        scope: Option<&SnapshotNode>,
        selector: &str,
    ) -> GatewayResult<Vec<SnapshotNode>> {
        self.inner.query_all(scope, selector)
    }

    fn attribute(&self, node: &SnapshotNode, name: &str) -> GatewayResult<Option<String>> {
        self.inner.attribute(node, name)
    }

    fn text(&self, node: &SnapshotNode) -> GatewayResult<String> {
        self.inner.text(node)
    }

    fn click(&mut self, node: &SnapshotNode) -> GatewayResult<()> {
        self.inner.click(node)
    }

    fn scroll(
        &mut self,
        node: Option<&SnapshotNode>,
        amount: i64,
        wait: Duration,
    ) -> GatewayResult<()> {
        self.inner.scroll(node, amount, wait)
    }
}

struct NoBrowser;

impl SessionFactory for NoBrowser {
    type View = SnapshotView;

    fn open(&self) -> GatewayResult<SnapshotView> {
        Err(GatewayError::Session("failed to launch browser".to_string()))
    }
}

#[test]
fn test_full_listing_record() {
    let mut view = SnapshotView::new();
    add_listing(&mut view, 1, Sections::default());

    let sink = Arc::new(MemorySink::new());
    let record = engine(sink.clone()).scrape(&mut view, &room_url(1)).unwrap();
    let json = record.to_value();

    assert_eq!(json["title"], "Desert Loft 1");
    assert_eq!(json["location"], "Henderson, Nevada, United States");
    assert_eq!(json["rating"], 4.85);
    assert_eq!(json["reviews"], 45);
    assert_eq!(json["rating_cleanliness"], 4.9);
    assert_eq!(json["rating_accuracy"], 4.8);
    assert_eq!(json["rating_check-in"], 5.0);
    assert_eq!(json["guest"], 4);
    assert_eq!(json["bedroom"], 2);
    assert_eq!(json["bed"], 2);
    assert_eq!(json["bath"], 1.5);
    assert_eq!(json["daily_rate"], 215);
    assert_eq!(json["currency"], "USD");
    assert_eq!(json["host_name"], "Dana");
    assert_eq!(json["host_url"], "https://www.airbnb.com/users/show/4242");
    assert_eq!(json["is_verified"], true);
    assert_eq!(json["is_superhost"], true);
    assert_eq!(json["host_response_rate"], "100%");
    assert_eq!(json["host_response_time"], "within an hour");
    assert_eq!(json["days_booking_per_month"], "March 2024 = 10, April 2024 = 5");
    assert_eq!(json["minimum_stay"], 3);
    assert_eq!(json["n_pictures"], 4);
    assert_eq!(json["url"], room_url(1));

    assert!(sink.warnings().is_empty(), "{:?}", sink.warnings());
    // first open day of March, then the gallery control
    assert_eq!(
        view.clicks(),
        &["21".to_string(), "Show all photos".to_string()]
    );
}

#[test]
fn test_record_url_is_canonical() {
    let mut view = SnapshotView::new();
    add_listing(&mut view, 2, Sections::default());
    let tracked = format!("{}?check_in=2024-03-21&adults=2", room_url(2));
    view.add_page(
        &tracked,
        "<html><body><div data-section-id=\"TITLE_DEFAULT\"><h1>Desert Loft 2</h1></div></body></html>",
    );

    let sink = Arc::new(MemorySink::new());
    let record = engine(sink).scrape(&mut view, &tracked).unwrap();
    assert_eq!(record.url, room_url(2));
}

#[test]
fn test_missing_title_drops_record_and_sibling_keeps_null_reviews() {
    let mut view = SnapshotView::new();
    add_listing(
        &mut view,
        1,
        Sections {
            title: false,
            reviews: Reviews::Missing,
            ..Sections::default()
        },
    );
    add_listing(
        &mut view,
        2,
        Sections {
            reviews: Reviews::Missing,
            ..Sections::default()
        },
    );

    let sink = Arc::new(MemorySink::new());
    let outcome = scrape_listings(
        &engine(sink.clone()),
        &mut view,
        &[room_url(1), room_url(2)],
        sink.as_ref(),
    );

    assert!(outcome.is_complete());
    assert_eq!(outcome.dropped, vec![room_url(1)]);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(sink.errors().len(), 1);

    let json = outcome.records[0].to_value();
    assert_eq!(json["title"], "Desert Loft 2");
    assert!(json["reviews"].is_null());
    assert!(json["rating"].is_null());
    assert!(json.get("rating_cleanliness").is_none());
    assert_eq!(json["location"], "Henderson, Nevada, United States");
    assert_eq!(json["daily_rate"], 215);
    assert_eq!(json["host_name"], "Dana");
    assert_eq!(json["minimum_stay"], 3);
    assert_eq!(json["n_pictures"], 3);

    let warnings = sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("REVIEWS"));
    assert!(warnings[0].contains(&room_url(2)));
}

#[test]
fn test_review_variants() {
    let mut view = SnapshotView::new();
    add_listing(
        &mut view,
        1,
        Sections {
            reviews: Reviews::Few,
            ..Sections::default()
        },
    );
    add_listing(
        &mut view,
        2,
        Sections {
            reviews: Reviews::Empty,
            ..Sections::default()
        },
    );

    let sink = Arc::new(MemorySink::new());
    let engine = engine(sink.clone());

    let few = engine.scrape(&mut view, &room_url(1)).unwrap().to_value();
    assert!(few["rating"].is_null());
    assert_eq!(few["reviews"], 2);

    let empty = engine.scrape(&mut view, &room_url(2)).unwrap().to_value();
    assert!(empty["rating"].is_null());
    assert!(empty["reviews"].is_null());

    assert!(sink.warnings().is_empty(), "{:?}", sink.warnings());
}

#[test]
fn test_unrecognized_facility_is_skipped_with_one_warning() {
    let mut view = SnapshotView::new();
    add_listing(
        &mut view,
        1,
        Sections {
            odd_facility: true,
            ..Sections::default()
        },
    );

    let sink = Arc::new(MemorySink::new());
    let record = engine(sink.clone()).scrape(&mut view, &room_url(1)).unwrap();

    assert_eq!(record.facilities.len(), 4);
    let warnings = sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with("Main facilities have different format"));
}

#[test]
fn test_unloaded_listing_does_not_repeat_previous_page() {
    let mut view = SnapshotView::new();
    add_listing(&mut view, 1, Sections::default());

    let sink = Arc::new(MemorySink::new());
    let outcome = scrape_listings(
        &engine(sink.clone()),
        &mut view,
        &[room_url(1), room_url(2)],
        sink.as_ref(),
    );

    assert!(outcome.is_complete());
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].url, room_url(1));
    assert_eq!(outcome.dropped, vec![room_url(2)]);
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.errors()[0].contains(&room_url(2)));
}

#[test]
fn test_session_failure_stops_the_loop() {
    let mut inner = SnapshotView::new();
    for id in 1..=3 {
        add_listing(&mut inner, id, Sections::default());
    }
    let mut view = DyingView {
        inner,
        dies_at: room_url(2),
    };

    let sink = Arc::new(MemorySink::new());
    let outcome = scrape_listings(
        &engine(sink.clone()),
        &mut view,
        &[room_url(1), room_url(2), room_url(3)],
        sink.as_ref(),
    );

    assert!(matches!(outcome.aborted, Some(ref e) if e.is_fatal()));
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].url, room_url(1));
    assert!(outcome.dropped.is_empty());
    assert_eq!(view.inner.visits(), &[room_url(1)]);
}

#[tokio::test]
async fn test_run_scrape_writes_records() {
    let mut site = SnapshotView::new();
    add_listing(&mut site, 1, Sections::default());
    add_listing(
        &mut site,
        2,
        Sections {
            title: false,
            ..Sections::default()
        },
    );
    add_listing(&mut site, 3, Sections::default());

    let dir = TempDir::new().unwrap();
    let records_path = dir.path().join("data.json");
    let config = config(&["Reno"], 1, "url.txt", records_path.to_str().unwrap());

    let sink = Arc::new(MemorySink::new());
    let outcome = run_scrape(
        &config,
        site,
        vec![room_url(1), room_url(2), room_url(3)],
        sink,
    )
    .await
    .unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.dropped, vec![room_url(2)]);

    write_records(&outcome.records, &records_path).unwrap();
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&records_path).unwrap()).unwrap();
    let titles: Vec<&str> = written
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Desert Loft 1", "Desert Loft 3"]);
}

#[tokio::test]
async fn test_run_scrape_without_session_aborts() {
    let config = config(&["Reno"], 1, "url.txt", "data.json");
    let sink = Arc::new(MemorySink::new());

    let result = run_scrape(&config, NoBrowser, vec![room_url(1)], sink).await;
    assert!(matches!(result, Err(HarvestError::Session(_))));
}
