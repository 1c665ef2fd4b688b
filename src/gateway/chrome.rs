//! Headless Chrome document view
//!
//! Drives a Chrome tab over the DevTools protocol. Element handles are kept
//! as DOM node ids so they can be passed around without borrowing the tab.

use crate::config::BrowserConfig;
use crate::gateway::{DocumentView, GatewayError, GatewayResult, SessionFactory};
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::Duration;

/// Chrome DOM node id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromeNode(u32);

/// One browser process with a single tab
pub struct ChromeView {
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeView {
    /// Launches Chrome and opens a tab
    pub fn launch(headless: bool, idle_timeout: Duration) -> GatewayResult<Self> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .idle_browser_timeout(idle_timeout)
            .build()
            .map_err(|e| GatewayError::Session(format!("invalid launch options: {}", e)))?;

        let browser = Browser::new(options)
            .map_err(|e| GatewayError::Session(format!("failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| GatewayError::Session(format!("failed to open tab: {}", e)))?;

        Ok(Self { browser, tab })
    }

    fn element(&self, node: &ChromeNode) -> GatewayResult<Element<'_>> {
        Element::new(&self.tab, node.0).map_err(|e| self.classify(e, "resolve node"))
    }

    /// Maps a protocol error, distinguishing a dead browser from a failed call
    fn classify(&self, error: anyhow::Error, action: &str) -> GatewayError {
        if self.browser.get_version().is_err() {
            GatewayError::Session(format!("{} failed, browser not responding: {}", action, error))
        } else {
            GatewayError::Interaction(format!("{} failed: {}", action, error))
        }
    }
}

impl DocumentView for ChromeView {
    type Node = ChromeNode;

    fn navigate(&mut self, url: &str, timeout: Duration) -> GatewayResult<()> {
        self.tab.set_default_timeout(timeout);
        let result = self
            .tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ());

        match result {
            Ok(()) => Ok(()),
            Err(e) => match self.classify(e, "navigate") {
                GatewayError::Interaction(_) => {
                    Err(GatewayError::timeout(format!("navigation to {}", url), timeout))
                }
                fatal => Err(fatal),
            },
        }
    }

    fn current_url(&self) -> GatewayResult<String> {
        Ok(self.tab.get_url())
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> GatewayResult<()> {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => Ok(()),
            Err(e) => match self.classify(e, "wait") {
                GatewayError::Interaction(_) => Err(GatewayError::timeout(selector, timeout)),
                fatal => Err(fatal),
            },
        }
    }

    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn query_one(
        &self,
        scope: Option<&ChromeNode>,
        selector: &str,
    ) -> GatewayResult<Option<ChromeNode>> {
        let found = match scope {
            Some(scope) => self.element(scope)?.find_element(selector).map(|e| e.node_id),
            None => self.tab.find_element(selector).map(|e| e.node_id),
        };

        match found {
            Ok(node_id) => Ok(Some(ChromeNode(node_id))),
            Err(e) if e.downcast_ref::<NoElementFound>().is_some() => Ok(None),
            Err(e) => Err(self.classify(e, "query")),
        }
    }

    fn query_all(
        &self,
        scope: Option<&ChromeNode>,
        selector: &str,
    ) -> GatewayResult<Vec<ChromeNode>> {
        let found = match scope {
            Some(scope) => self
                .element(scope)?
                .find_elements(selector)
                .map(|elements| elements.iter().map(|e| e.node_id).collect::<Vec<_>>()),
            None => self
                .tab
                .find_elements(selector)
                .map(|elements| elements.iter().map(|e| e.node_id).collect::<Vec<_>>()),
        };

        match found {
            Ok(ids) => Ok(ids.into_iter().map(ChromeNode).collect()),
            Err(e) if e.downcast_ref::<NoElementFound>().is_some() => Ok(Vec::new()),
            Err(e) => Err(self.classify(e, "query")),
        }
    }

    fn attribute(&self, node: &ChromeNode, name: &str) -> GatewayResult<Option<String>> {
        self.element(node)?
            .get_attribute_value(name)
            .map_err(|e| self.classify(e, "read attribute"))
    }

    fn text(&self, node: &ChromeNode) -> GatewayResult<String> {
        self.element(node)?
            .get_inner_text()
            .map_err(|e| self.classify(e, "read text"))
    }

    fn click(&mut self, node: &ChromeNode) -> GatewayResult<()> {
        let element = self.element(node)?;
        element
            .click()
            .map(|_| ())
            .map_err(|e| self.classify(e, "click"))
    }

    fn scroll(
        &mut self,
        node: Option<&ChromeNode>,
        amount: i64,
        wait: Duration,
    ) -> GatewayResult<()> {
        match node {
            Some(node) => {
                self.element(node)?
                    .call_js_fn(
                        "function(amount) { this.scrollBy(0, amount); }",
                        vec![serde_json::json!(amount)],
                        false,
                    )
                    .map_err(|e| self.classify(e, "scroll"))?;
            }
            None => {
                self.tab
                    .evaluate(&format!("window.scrollBy(0, {})", amount), false)
                    .map_err(|e| self.classify(e, "scroll"))?;
            }
        }
        std::thread::sleep(wait);
        Ok(())
    }
}

/// Launches one Chrome session per `open` call
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
    idle_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(headless: bool, idle_timeout: Duration) -> Self {
        Self {
            headless,
            idle_timeout,
        }
    }

    /// Launcher whose idle bound outlasts the longest configured wait
    pub fn from_config(config: &BrowserConfig) -> Self {
        let longest = config
            .navigation_timeout()
            .max(config.render_timeout())
            .max(config.settle_delay());
        Self::new(config.headless, longest + Duration::from_secs(30))
    }
}

impl SessionFactory for ChromeLauncher {
    type View = ChromeView;

    fn open(&self) -> GatewayResult<ChromeView> {
        ChromeView::launch(self.headless, self.idle_timeout)
    }
}
