//! URL handling module for Rental-Harvest
//!
//! This module provides the canonical listing-URL rule, resolution of
//! page-relative hrefs, and the insertion-ordered, deduplicated link set
//! accumulated by a crawl run.

mod normalize;

use std::collections::HashSet;
use url::Url;

// Re-export main functions
pub use normalize::{canonicalize_url, resolve_href};

/// Insertion-ordered set of canonical listing URLs
///
/// Links are canonicalized on insertion, so two links that differ only by
/// query string occupy a single entry. The first-seen position wins.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    ordered: Vec<Url>,
    seen: HashSet<String>,
}

impl LinkSet {
    /// Creates an empty link set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a link set from raw harvested links
    ///
    /// Links that fail to canonicalize are logged and skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use rental_harvest::url::LinkSet;
    ///
    /// let links = LinkSet::from_links([
    ///     "https://www.airbnb.com/rooms/1?x=1",
    ///     "https://www.airbnb.com/rooms/2",
    ///     "https://www.airbnb.com/rooms/1",
    /// ]);
    /// assert_eq!(links.len(), 2);
    /// ```
    pub fn from_links<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for link in links {
            let link = link.as_ref();
            if let Err(e) = set.insert(link) {
                tracing::debug!("Skipping link {}: {}", link, e);
            }
        }
        set
    }

    /// Canonicalizes and inserts a link
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The canonical URL was not yet present
    /// * `Ok(false)` - The canonical URL was already present
    /// * `Err(UrlError)` - The link could not be canonicalized
    pub fn insert(&mut self, link: &str) -> crate::UrlResult<bool> {
        let canonical = canonicalize_url(link)?;
        if self.seen.insert(canonical.as_str().to_string()) {
            self.ordered.push(canonical);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Returns true if the canonical form of `link` is present
    pub fn contains(&self, link: &str) -> bool {
        canonicalize_url(link)
            .map(|url| self.seen.contains(url.as_str()))
            .unwrap_or(false)
    }

    /// Number of unique canonical URLs
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Returns true if no URL has been inserted
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Iterates the canonical URLs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        self.ordered.iter()
    }

    /// Consumes the set, returning the canonical URLs as strings in first-seen order
    pub fn into_strings(self) -> Vec<String> {
        self.ordered.into_iter().map(String::from).collect()
    }
}
