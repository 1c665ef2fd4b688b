//! Integration tests for the crawl phase

use crate::fixtures::{config, result_page, room_url, BASE};
use rental_harvest::crawler::{run_crawl, CrawlController};
use rental_harvest::diagnostics::MemorySink;
use rental_harvest::gateway::{GatewayError, GatewayResult, SessionFactory, SnapshotView};
use rental_harvest::output::{read_url_list, write_url_list};
use rental_harvest::HarvestError;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;

struct NoBrowser;

impl SessionFactory for NoBrowser {
    type View = SnapshotView;

    fn open(&self) -> GatewayResult<SnapshotView> {
        Err(GatewayError::Session("failed to launch browser".to_string()))
    }
}

fn search(keyword: &str) -> String {
    format!("{}/s/{}/homes", BASE, keyword)
}

#[test]
fn test_pagination_visits_each_page_once_in_order() {
    let pages = 4;
    let mut view = SnapshotView::new();
    for page in 1..=pages {
        let url = if page == 1 {
            search("Reno")
        } else {
            format!("{}?page={}", search("Reno"), page)
        };
        let next = (page < pages).then(|| format!("/s/Reno/homes?page={}", page + 1));
        view.add_page(&url, result_page(page, &[page * 10, page * 10 + 1], next.as_deref()));
    }

    let sink = Arc::new(MemorySink::new());
    let controller = CrawlController::new(
        Url::parse(BASE).unwrap(),
        config(&["Reno"], 1, "u", "r").browser,
        sink.clone(),
    );
    let links = controller.crawl_keyword(&mut view, "Reno").unwrap();

    let expected_visits: Vec<String> = (1..=pages)
        .map(|page| {
            if page == 1 {
                search("Reno")
            } else {
                format!("{}?page={}", search("Reno"), page)
            }
        })
        .collect();
    assert_eq!(view.visits(), expected_visits.as_slice());
    assert_eq!(links.len(), 8);
    assert!(links[0].starts_with(&room_url(10)));
    assert!(links[7].starts_with(&room_url(41)));
    assert!(sink.warnings().is_empty());

    let page_logs: Vec<String> = sink
        .entries()
        .into_iter()
        .map(|entry| entry.message)
        .filter(|message| message.starts_with("'Reno' page"))
        .collect();
    assert_eq!(page_logs.len(), 4);
    assert!(page_logs[3].starts_with("'Reno' page 4"));
}

#[tokio::test]
async fn test_crawl_deduplicates_canonical_urls_in_first_seen_order() {
    let mut site = SnapshotView::new();
    site.add_page(BASE, "<html><body></body></html>");
    site.add_page(
        &search("Reno"),
        result_page(1, &[3, 1], Some("/s/Reno/homes?page=2")),
    );
    site.add_page(
        &format!("{}?page=2", search("Reno")),
        result_page(2, &[1, 2], None),
    );
    site.add_page(&search("Henderson"), result_page(1, &[2, 5, 3], None));

    let dir = TempDir::new().unwrap();
    let urls_path = dir.path().join("url.txt");
    let config = config(
        &["Reno", "Henderson"],
        2,
        urls_path.to_str().unwrap(),
        "data.json",
    );

    let sink = Arc::new(MemorySink::new());
    let outcome = run_crawl(&config, site, sink).await.unwrap();
    assert_eq!(outcome.harvested, 7);

    write_url_list(&outcome.links, &urls_path).unwrap();
    assert_eq!(
        read_url_list(&urls_path).unwrap(),
        vec![room_url(3), room_url(1), room_url(2), room_url(5)]
    );
}

#[tokio::test]
async fn test_keyword_render_timeout_does_not_stop_other_keywords() {
    let mut site = SnapshotView::new();
    site.add_page(BASE, "<html><body></body></html>");
    site.add_page(&search("Reno"), "<html><body><p>Try again later</p></body></html>");
    site.add_page(&search("Henderson"), result_page(1, &[8], None));

    let sink = Arc::new(MemorySink::new());
    let outcome = run_crawl(&config(&["Reno", "Henderson"], 1, "u", "r"), site, sink.clone())
        .await
        .unwrap();

    assert_eq!(outcome.links.into_strings(), vec![room_url(8)]);
    let warnings = sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Keyword 'Reno'"));
}

#[tokio::test]
async fn test_session_acquisition_failure_aborts_crawl() {
    let sink = Arc::new(MemorySink::new());
    let result = run_crawl(&config(&["Reno", "Henderson"], 2, "u", "r"), NoBrowser, sink).await;

    assert!(matches!(result, Err(HarvestError::Session(e)) if e.is_fatal()));
}
