//! Snapshot-backed document view
//!
//! Serves pre-rendered HTML pages keyed by URL and answers gateway queries
//! with `scraper`. Nothing is executed: waits succeed immediately when the
//! selector already matches, scrolling and pausing are only recorded, and a
//! click can swap the current document for a scripted follow-up state.

use crate::gateway::{DocumentView, GatewayError, GatewayResult, SessionFactory};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Tags rendered on their own line by `text`
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "caption", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "ol", "p",
    "section", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Element position as child-element indices from the root element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    path: Vec<usize>,
}

/// A click-triggered document change
#[derive(Debug, Clone)]
struct ClickTransition {
    trigger: String,
    html: String,
}

/// Document view answering from in-memory HTML snapshots
#[derive(Debug, Clone, Default)]
pub struct SnapshotView {
    pages: HashMap<String, String>,
    transitions: Vec<ClickTransition>,
    current_url: Option<String>,
    current_html: Option<String>,
    visits: Vec<String>,
    clicks: Vec<String>,
    scrolls: usize,
    paused: Duration,
}

impl SnapshotView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the HTML served for `url`
    pub fn add_page(&mut self, url: &str, html: impl Into<String>) -> &mut Self {
        self.pages.insert(page_key(url), html.into());
        self
    }

    /// Replaces the current document with `html` when a node matching
    /// `trigger` is clicked; the current URL is unchanged
    pub fn on_click(&mut self, trigger: &str, html: impl Into<String>) -> &mut Self {
        self.transitions.push(ClickTransition {
            trigger: trigger.to_string(),
            html: html.into(),
        });
        self
    }

    /// URLs loaded so far, in order
    pub fn visits(&self) -> &[String] {
        &self.visits
    }

    /// Text of each clicked node, in order
    pub fn clicks(&self) -> &[String] {
        &self.clicks
    }

    /// Number of scroll calls served
    pub fn scrolls(&self) -> usize {
        self.scrolls
    }

    /// Total time callers asked to pause
    pub fn paused(&self) -> Duration {
        self.paused
    }

    fn document(&self) -> GatewayResult<Html> {
        let html = self
            .current_html
            .as_ref()
            .ok_or_else(|| GatewayError::Interaction("no document loaded".to_string()))?;
        Ok(Html::parse_document(html))
    }

    fn matches(&self, selector: &str, node: &SnapshotNode) -> GatewayResult<bool> {
        let document = self.document()?;
        let selector = parse_selector(selector)?;
        Ok(document.select(&selector).any(|element| path_of(element) == *node))
    }
}

impl DocumentView for SnapshotView {
    type Node = SnapshotNode;

    fn navigate(&mut self, url: &str, timeout: Duration) -> GatewayResult<()> {
        let key = page_key(url);
        let html = self
            .pages
            .get(&key)
            .cloned()
            .ok_or_else(|| GatewayError::timeout(format!("navigation to {}", url), timeout))?;

        self.visits.push(key.clone());
        self.current_url = Some(key);
        self.current_html = Some(html);
        Ok(())
    }

    fn current_url(&self) -> GatewayResult<String> {
        self.current_url
            .clone()
            .ok_or_else(|| GatewayError::Interaction("no document loaded".to_string()))
    }

    fn wait_for(&mut self, selector: &str, timeout: Duration) -> GatewayResult<()> {
        if self.query_one(None, selector)?.is_some() {
            Ok(())
        } else {
            Err(GatewayError::timeout(selector, timeout))
        }
    }

    fn pause(&mut self, duration: Duration) {
        self.paused += duration;
    }

    fn query_one(
        &self,
        scope: Option<&SnapshotNode>,
        selector: &str,
    ) -> GatewayResult<Option<SnapshotNode>> {
        Ok(self.query_all(scope, selector)?.into_iter().next())
    }

    fn query_all(
        &self,
        scope: Option<&SnapshotNode>,
        selector: &str,
    ) -> GatewayResult<Vec<SnapshotNode>> {
        let document = self.document()?;
        let selector = parse_selector(selector)?;

        let nodes = match scope {
            Some(scope) => resolve(&document, scope)?
                .select(&selector)
                .map(path_of)
                .collect(),
            None => document.select(&selector).map(path_of).collect(),
        };
        Ok(nodes)
    }

    fn attribute(&self, node: &SnapshotNode, name: &str) -> GatewayResult<Option<String>> {
        let document = self.document()?;
        let element = resolve(&document, node)?;
        Ok(element.value().attr(name).map(str::to_string))
    }

    fn text(&self, node: &SnapshotNode) -> GatewayResult<String> {
        let document = self.document()?;
        let element = resolve(&document, node)?;
        Ok(inner_text(element))
    }

    fn click(&mut self, node: &SnapshotNode) -> GatewayResult<()> {
        let label = self.text(node)?;
        self.clicks.push(label);

        let mut replacement = None;
        for transition in &self.transitions {
            if self.matches(&transition.trigger, node)? {
                replacement = Some(transition.html.clone());
                break;
            }
        }
        if let Some(html) = replacement {
            self.current_html = Some(html);
        }
        Ok(())
    }

    fn scroll(
        &mut self,
        node: Option<&SnapshotNode>,
        _amount: i64,
        wait: Duration,
    ) -> GatewayResult<()> {
        if let Some(node) = node {
            let document = self.document()?;
            resolve(&document, node)?;
        }
        self.scrolls += 1;
        self.paused += wait;
        Ok(())
    }
}

impl SessionFactory for SnapshotView {
    type View = SnapshotView;

    fn open(&self) -> GatewayResult<SnapshotView> {
        Ok(self.clone())
    }
}

/// Pages are keyed by their parsed form so `https://host` and `https://host/` agree
fn page_key(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

fn parse_selector(selector: &str) -> GatewayResult<Selector> {
    Selector::parse(selector).map_err(|_| GatewayError::InvalidSelector(selector.to_string()))
}

fn path_of(element: ElementRef) -> SnapshotNode {
    let mut path = Vec::new();
    let mut node = *element;

    while let Some(parent) = node.parent() {
        if !parent.value().is_element() {
            break;
        }
        path.push(
            node.prev_siblings()
                .filter(|sibling| sibling.value().is_element())
                .count(),
        );
        node = parent;
    }

    path.reverse();
    SnapshotNode { path }
}

fn resolve<'a>(document: &'a Html, node: &SnapshotNode) -> GatewayResult<ElementRef<'a>> {
    let mut current = document.root_element();
    for &index in &node.path {
        current = current
            .children()
            .filter_map(ElementRef::wrap)
            .nth(index)
            .ok_or_else(|| GatewayError::Interaction("node is no longer attached".to_string()))?;
    }
    Ok(current)
}

/// Approximates rendered text: block elements start new lines, whitespace
/// within a line collapses, blank lines are dropped
fn inner_text(element: ElementRef) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if name == "script" || name == "style" {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}
