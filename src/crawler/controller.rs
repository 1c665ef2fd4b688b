//! Pagination Crawl Controller
//!
//! Drives the location search for each keyword through one document view
//! session: load the result page, wait for the result list to render,
//! harvest listing links, then follow the "next page" control until it is
//! gone. Links come out raw and in encounter order; canonicalization and
//! deduplication happen once the whole crawl is done.

use crate::config::BrowserConfig;
use crate::diagnostics::LogSink;
use crate::gateway::{text_of, DocumentView, GatewayError, GatewayResult};
use crate::url::resolve_href;
use crate::{HarvestError, UrlError, UrlResult};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Rendered once the result list of a search page is ready
pub const RESULT_MARKER: &str = "div[itemprop=itemListElement]";
/// Listing card links on a result page
pub const LISTING_LINK: &str = "a[aria-labelledby*=title_]";
/// Pagination control leading to the next result page
pub const NEXT_PAGE: &str = "a[aria-label=Next]";
/// Current page number in the pagination bar
pub const PAGE_INDICATOR: &str = "button[aria-current=page]";
/// Announcement overlay shown on first visit
pub const STARTUP_OVERLAY: &str = "div[aria-labelledby=announcement-curtain]";
/// Close control inside the overlay
pub const OVERLAY_CLOSE: &str = "button[aria-label=Close]";

/// Builds the search entry point for a keyword: `<base>/s/<keyword>/homes`
///
/// # Examples
///
/// ```
/// use rental_harvest::crawler::search_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.airbnb.com").unwrap();
/// let url = search_url(&base, "Las Vegas, NV").unwrap();
/// assert_eq!(url.as_str(), "https://www.airbnb.com/s/Las%20Vegas,%20NV/homes");
/// ```
pub fn search_url(base: &Url, keyword: &str) -> UrlResult<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| UrlError::Parse(format!("{} cannot carry a path", base)))?
        .pop_if_empty()
        .extend(["s", keyword.trim(), "homes"]);
    Ok(url)
}

/// Crawls result pages for a list of keywords through one session
pub struct CrawlController {
    base_url: Url,
    browser: BrowserConfig,
    sink: Arc<dyn LogSink>,
}

impl CrawlController {
    pub fn new(base_url: Url, browser: BrowserConfig, sink: Arc<dyn LogSink>) -> Self {
        Self {
            base_url,
            browser,
            sink,
        }
    }

    /// Crawls every keyword in order and returns the concatenated links
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Harvested links, duplicates included
    /// * `Err(HarvestError::Session)` - The session became unusable
    pub fn crawl<V: DocumentView>(
        &self,
        view: &mut V,
        keywords: &[String],
    ) -> Result<Vec<String>, HarvestError> {
        self.start(view)?;

        let mut links = Vec::new();
        for keyword in keywords {
            links.extend(self.crawl_keyword(view, keyword)?);
        }
        Ok(links)
    }

    /// Loads the home page and dismisses the announcement overlay if shown
    pub fn start<V: DocumentView>(&self, view: &mut V) -> Result<(), HarvestError> {
        if let Err(e) = view.navigate(self.base_url.as_str(), self.browser.navigation_timeout()) {
            if e.is_fatal() {
                return Err(HarvestError::Session(e));
            }
            self.sink.warn(&format!("Home page did not load: {}", e));
            return Ok(());
        }

        match self.dismiss_overlay(view) {
            Ok(true) => self.sink.debug("Dismissed announcement overlay"),
            Ok(false) => {}
            Err(e) if e.is_fatal() => return Err(HarvestError::Session(e)),
            Err(e) => self.sink.debug(&format!("Overlay not dismissed: {}", e)),
        }
        Ok(())
    }

    fn dismiss_overlay<V: DocumentView>(&self, view: &mut V) -> GatewayResult<bool> {
        let Some(overlay) = view.query_one(None, STARTUP_OVERLAY)? else {
            return Ok(false);
        };
        let Some(close) = view.query_one(Some(&overlay), OVERLAY_CLOSE)? else {
            return Ok(false);
        };
        view.click(&close)?;
        Ok(true)
    }

    /// Crawls every result page of one keyword
    ///
    /// A non-fatal failure on any page ends this keyword with the links
    /// harvested so far; only a session failure is returned as an error.
    pub fn crawl_keyword<V: DocumentView>(
        &self,
        view: &mut V,
        keyword: &str,
    ) -> Result<Vec<String>, HarvestError> {
        let mut links = Vec::new();
        match self.paginate(view, keyword, &mut links) {
            Ok(pages) => self.sink.info(&format!(
                "Keyword '{}': {} links over {} pages",
                keyword,
                links.len(),
                pages
            )),
            Err(e) if e.is_fatal() => return Err(HarvestError::Session(e)),
            Err(e) => self.sink.warn(&format!(
                "Keyword '{}' stopped after {} links: {}",
                keyword,
                links.len(),
                e
            )),
        }
        Ok(links)
    }

    fn paginate<V: DocumentView>(
        &self,
        view: &mut V,
        keyword: &str,
        links: &mut Vec<String>,
    ) -> GatewayResult<u32> {
        let entry = search_url(&self.base_url, keyword)
            .map_err(|e| GatewayError::Interaction(e.to_string()))?;
        self.sink.info(&format!("Searching '{}'", keyword));

        let mut visited = HashSet::new();
        visited.insert(entry.to_string());
        view.navigate(entry.as_str(), self.browser.navigation_timeout())?;

        let mut pages = 0;
        loop {
            view.wait_for(RESULT_MARKER, self.browser.render_timeout())?;
            view.pause(self.browser.settle_delay());

            pages += 1;
            let harvested = self.harvest(view, links)?;
            let indicator = text_of(view, None, PAGE_INDICATOR)?.unwrap_or_else(|| pages.to_string());
            self.sink
                .info(&format!("'{}' page {}: {} links", keyword, indicator, harvested));

            let Some(next) = view.query_one(None, NEXT_PAGE)? else {
                return Ok(pages);
            };

            match view.attribute(&next, "href")? {
                Some(href) => {
                    let target = resolve_href(&self.base_url, &href)
                        .map_err(|e| GatewayError::Interaction(e.to_string()))?;
                    if !visited.insert(target.to_string()) {
                        self.sink
                            .warn(&format!("Next page {} already visited, stopping", target));
                        return Ok(pages);
                    }
                    view.navigate(target.as_str(), self.browser.navigation_timeout())?;
                }
                None => view.click(&next)?,
            }
        }
    }

    /// Appends the absolute listing links of the current page
    fn harvest<V: DocumentView>(&self, view: &V, links: &mut Vec<String>) -> GatewayResult<usize> {
        let before = links.len();
        for node in view.query_all(None, LISTING_LINK)? {
            let Some(href) = view.attribute(&node, "href")? else {
                continue;
            };
            match resolve_href(&self.base_url, &href) {
                Ok(url) => links.push(url.into()),
                Err(e) => self.sink.debug(&format!("Skipping link '{}': {}", href, e)),
            }
        }
        Ok(links.len() - before)
    }
}
