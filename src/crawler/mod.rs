//! Crawler module for the link-harvesting phase
//!
//! This module contains the crawl phase of a run:
//! - Keyword search and result-page pagination
//! - Link harvesting from rendered result lists
//! - Fanning keywords out over parallel browser sessions
//! - Canonicalizing and deduplicating the harvested links once at the end

mod controller;

pub use controller::{
    search_url, CrawlController, LISTING_LINK, NEXT_PAGE, PAGE_INDICATOR, RESULT_MARKER,
    STARTUP_OVERLAY,
};

use crate::config::Config;
use crate::diagnostics::LogSink;
use crate::gateway::SessionFactory;
use crate::url::LinkSet;
use crate::HarvestError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use url::Url;

/// Result of a crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Links harvested across all keywords, before deduplication
    pub harvested: usize,

    /// Canonical, deduplicated links in first-seen order
    pub links: LinkSet,
}

/// Keywords not yet claimed by a worker, tagged with their input position
type KeywordQueue = Mutex<VecDeque<(usize, String)>>;

/// Runs the crawl phase
///
/// With one session the keywords are crawled in order on a single blocking
/// worker. With more, each worker opens its own session and claims keywords
/// from a shared queue; per-keyword results are put back in keyword order
/// before deduplication, so the output does not depend on scheduling.
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - All keywords were crawled (possibly partially)
/// * `Err(HarvestError)` - A session could not be opened or failed
pub async fn run_crawl<F: SessionFactory>(
    config: &Config,
    factory: F,
    sink: Arc<dyn LogSink>,
) -> Result<CrawlOutcome, HarvestError> {
    let base_url = Url::parse(&config.search.base_url)?;
    let controller = Arc::new(CrawlController::new(
        base_url,
        config.browser.clone(),
        sink.clone(),
    ));
    let factory = Arc::new(factory);

    let keywords = &config.search.keywords;
    let workers = (config.crawler.sessions.max(1) as usize).min(keywords.len().max(1));
    sink.info(&format!(
        "Crawling {} keywords with {} session(s)",
        keywords.len(),
        workers
    ));

    let queue: Arc<KeywordQueue> = Arc::new(Mutex::new(
        keywords.iter().cloned().enumerate().collect(),
    ));
    let aborted = Arc::new(AtomicBool::new(false));

    let mut tasks = JoinSet::new();
    for worker in 0..workers {
        let controller = controller.clone();
        let factory = factory.clone();
        let queue = queue.clone();
        let aborted = aborted.clone();
        let sink = sink.clone();

        tasks.spawn_blocking(move || {
            let result = crawl_worker(&controller, factory.as_ref(), &queue, &aborted);
            if let Err(e) = &result {
                aborted.store(true, Ordering::SeqCst);
                sink.error(&format!("Crawl worker {} failed: {}", worker, e));
            }
            result
        });
    }

    let mut per_keyword: Vec<(usize, Vec<String>)> = Vec::with_capacity(keywords.len());
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(results) => per_keyword.extend(results),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    per_keyword.sort_by_key(|(index, _)| *index);
    let harvested: Vec<String> = per_keyword.into_iter().flat_map(|(_, links)| links).collect();
    let links = LinkSet::from_links(&harvested);

    sink.info(&format!(
        "Harvested {} links, {} unique",
        harvested.len(),
        links.len()
    ));

    Ok(CrawlOutcome {
        harvested: harvested.len(),
        links,
    })
}

/// Opens one session and crawls keywords from the queue until it is empty
fn crawl_worker<F: SessionFactory>(
    controller: &CrawlController,
    factory: &F,
    queue: &KeywordQueue,
    aborted: &AtomicBool,
) -> Result<Vec<(usize, Vec<String>)>, HarvestError> {
    let mut view = factory.open().map_err(HarvestError::Session)?;
    controller.start(&mut view)?;

    let mut results = Vec::new();
    while !aborted.load(Ordering::SeqCst) {
        let next = match queue.lock() {
            Ok(mut pending) => pending.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        let Some((index, keyword)) = next else {
            break;
        };
        results.push((index, controller.crawl_keyword(&mut view, &keyword)?));
    }
    Ok(results)
}
