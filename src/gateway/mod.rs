//! Document View Gateway
//!
//! The primitives every other component drives: navigate, wait for render,
//! query nodes, read text and attributes, click, scroll. Two backends are
//! provided:
//! - [`ChromeView`] drives a real headless Chrome session
//! - [`SnapshotView`] answers the same calls from pre-rendered HTML pages

mod chrome;
mod snapshot;

pub use chrome::{ChromeLauncher, ChromeNode, ChromeView};
pub use snapshot::{SnapshotNode, SnapshotView};

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a document view session
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// A navigation or render wait exceeded its bound. Recoverable and
    /// scoped to the current page or section.
    #[error("Timed out after {waited_ms}ms waiting for {target}")]
    Timeout { target: String, waited_ms: u128 },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    /// A node could not be read or interacted with
    #[error("Interaction failed: {0}")]
    Interaction(String),

    /// The session itself is unusable; the run cannot continue
    #[error("Session unusable: {0}")]
    Session(String),
}

impl GatewayError {
    pub fn timeout(target: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            target: target.into(),
            waited_ms: waited.as_millis(),
        }
    }

    /// Returns true if the session cannot serve further requests
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    /// Returns true for bounded-wait expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// A rendered document driven through a single session
///
/// Queries take an optional scope node; `None` searches the whole document.
/// Calls that may change what is rendered take `&mut self`, which keeps all
/// interaction within one session strictly sequential.
pub trait DocumentView {
    /// Handle to a rendered element, valid until the next navigation
    type Node: Clone;

    /// Loads `url`, waiting at most `timeout` for the navigation to settle
    fn navigate(&mut self, url: &str, timeout: Duration) -> GatewayResult<()>;

    /// The URL of the currently loaded document
    fn current_url(&self) -> GatewayResult<String>;

    /// Blocks until `selector` matches, or fails with [`GatewayError::Timeout`]
    fn wait_for(&mut self, selector: &str, timeout: Duration) -> GatewayResult<()>;

    /// Blocks for a fixed duration to let client-side rendering settle
    fn pause(&mut self, duration: Duration);

    /// First node matching `selector` within `scope`
    fn query_one(
        &self,
        scope: Option<&Self::Node>,
        selector: &str,
    ) -> GatewayResult<Option<Self::Node>>;

    /// All nodes matching `selector` within `scope`, in document order
    fn query_all(&self, scope: Option<&Self::Node>, selector: &str)
        -> GatewayResult<Vec<Self::Node>>;

    /// Value of attribute `name`, or `None` when unset
    fn attribute(&self, node: &Self::Node, name: &str) -> GatewayResult<Option<String>>;

    /// Rendered text of `node`, block boundaries as newlines
    fn text(&self, node: &Self::Node) -> GatewayResult<String>;

    fn click(&mut self, node: &Self::Node) -> GatewayResult<()>;

    /// Scrolls `node` (or the page when `None`) by `amount` pixels, then waits
    fn scroll(&mut self, node: Option<&Self::Node>, amount: i64, wait: Duration)
        -> GatewayResult<()>;
}

/// Opens document view sessions
///
/// The crawl opens one session per worker; a failure here is fatal to the run.
pub trait SessionFactory: Send + Sync + 'static {
    type View: DocumentView + Send + 'static;

    fn open(&self) -> GatewayResult<Self::View>;
}

/// First node matching `selector` whose text contains `needle`
pub fn find_by_text<V: DocumentView>(
    view: &V,
    scope: Option<&V::Node>,
    selector: &str,
    needle: &str,
) -> GatewayResult<Option<V::Node>> {
    for node in view.query_all(scope, selector)? {
        if view.text(&node)?.contains(needle) {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

/// Text of the first node matching `selector` within `scope`, trimmed
pub fn text_of<V: DocumentView>(
    view: &V,
    scope: Option<&V::Node>,
    selector: &str,
) -> GatewayResult<Option<String>> {
    match view.query_one(scope, selector)? {
        Some(node) => Ok(Some(view.text(&node)?.trim().to_string())),
        None => Ok(None),
    }
}
