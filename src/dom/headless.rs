//! In-memory browser host
//!
//! A flat element list stands in for the DOM. Windows journal every
//! navigation, activation and scroll with a monotonic timestamp, which is
//! enough to drive and observe a full replay without a real browser.

use super::{BrowserHost, BrowserWindow, Dimensions, Document, ElementQuery, NodeId};
use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct HeadlessElement {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
}

impl HeadlessElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            text: String::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn matches(&self, query: &ElementQuery) -> bool {
        if let Some(tag) = &query.tag {
            if !self.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(text) = &query.text {
            if self.text.trim() != text.trim() {
                return false;
            }
        }
        query
            .attributes
            .iter()
            .all(|(name, value)| self.attributes.get(name) == Some(value))
    }
}

/// Something observable that happened in a headless window
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Navigated(String),
    Clicked(NodeId),
    Scrolled { x: f64, y: f64 },
    Closed,
}

#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub at: Instant,
    pub event: WindowEvent,
}

type Journal = Arc<ParkingMutex<Vec<JournalEntry>>>;

fn record(journal: &Journal, event: WindowEvent) {
    journal.lock().push(JournalEntry {
        at: Instant::now(),
        event,
    });
}

pub struct HeadlessDocument {
    elements: ParkingMutex<Vec<HeadlessElement>>,
    scroll_size: ParkingMutex<Dimensions>,
    journal: Journal,
}

impl HeadlessDocument {
    pub fn new(scroll_size: Dimensions) -> Self {
        Self {
            elements: ParkingMutex::new(Vec::new()),
            scroll_size: ParkingMutex::new(scroll_size),
            journal: Arc::new(ParkingMutex::new(Vec::new())),
        }
    }

    /// Append an element and return its id
    pub fn append(&self, element: HeadlessElement) -> NodeId {
        let mut elements = self.elements.lock();
        elements.push(element);
        elements.len() - 1
    }

    pub fn set_scroll_size(&self, size: Dimensions) {
        *self.scroll_size.lock() = size;
    }

    /// Element ids clicked so far, oldest first
    pub fn clicks(&self) -> Vec<NodeId> {
        self.journal
            .lock()
            .iter()
            .filter_map(|entry| match entry.event {
                WindowEvent::Clicked(node) => Some(node),
                _ => None,
            })
            .collect()
    }
}

impl Document for HeadlessDocument {
    fn query(&self, query: &ElementQuery) -> Option<NodeId> {
        self.elements.lock().iter().position(|el| el.matches(query))
    }

    fn click(&self, node: NodeId) {
        if node < self.elements.lock().len() {
            record(&self.journal, WindowEvent::Clicked(node));
        }
    }

    fn scroll_size(&self) -> Dimensions {
        *self.scroll_size.lock()
    }
}

pub struct HeadlessWindow {
    document: Arc<HeadlessDocument>,
    viewport: Dimensions,
    location: ParkingMutex<String>,
    scroll: ParkingMutex<(f64, f64)>,
    closed: AtomicBool,
    load_delay: Duration,
}

impl HeadlessWindow {
    pub fn new(document: Arc<HeadlessDocument>, viewport: Dimensions, url: &str) -> Self {
        Self {
            document,
            viewport,
            location: ParkingMutex::new(url.to_string()),
            scroll: ParkingMutex::new((0.0, 0.0)),
            closed: AtomicBool::new(false),
            load_delay: Duration::ZERO,
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn location(&self) -> String {
        self.location.lock().clone()
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        *self.scroll.lock()
    }

    pub fn headless_document(&self) -> &Arc<HeadlessDocument> {
        &self.document
    }

    /// Journal of the shared document. Windows opened over the same
    /// document see each other's entries.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.document.journal.lock().clone()
    }
}

#[async_trait]
impl BrowserWindow for HeadlessWindow {
    fn document(&self) -> Arc<dyn Document> {
        self.document.clone()
    }

    fn viewport(&self) -> Dimensions {
        self.viewport
    }

    fn navigate(&self, path: &str) {
        *self.location.lock() = path.to_string();
        record(&self.document.journal, WindowEvent::Navigated(path.to_string()));
    }

    fn scroll_to(&self, x: f64, y: f64) {
        *self.scroll.lock() = (x, y);
        record(&self.document.journal, WindowEvent::Scrolled { x, y });
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            record(&self.document.journal, WindowEvent::Closed);
        }
    }

    async fn wait_for_load(&self) {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
    }
}

/// Host that opens [`HeadlessWindow`]s over a shared document
pub struct HeadlessBrowser {
    document: Arc<HeadlessDocument>,
    viewport: Dimensions,
    load_delay: Duration,
    popups_blocked: AtomicBool,
    opened: ParkingMutex<Vec<Arc<HeadlessWindow>>>,
}

impl HeadlessBrowser {
    pub fn new(document: Arc<HeadlessDocument>, viewport: Dimensions) -> Self {
        Self {
            document,
            viewport,
            load_delay: Duration::ZERO,
            popups_blocked: AtomicBool::new(false),
            opened: ParkingMutex::new(Vec::new()),
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn block_popups(&self, blocked: bool) {
        self.popups_blocked.store(blocked, Ordering::SeqCst);
    }

    /// Windows opened so far, oldest first
    pub fn windows(&self) -> Vec<Arc<HeadlessWindow>> {
        self.opened.lock().clone()
    }
}

impl BrowserHost for HeadlessBrowser {
    fn open_window(&self, url: &str) -> Option<Arc<dyn BrowserWindow>> {
        if self.popups_blocked.load(Ordering::SeqCst) {
            tracing::debug!("Headless browser refused to open {}", url);
            return None;
        }

        let window = Arc::new(
            HeadlessWindow::new(self.document.clone(), self.viewport, url)
                .with_load_delay(self.load_delay),
        );
        self.opened.lock().push(window.clone());
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_matches_all_parts() {
        let doc = HeadlessDocument::new(Dimensions::default());
        doc.append(HeadlessElement::new("button").text("Cancel"));
        let save = doc.append(
            HeadlessElement::new("button")
                .attr("type", "submit")
                .text("  Save "),
        );

        let query = ElementQuery::tag("button").with_text("Save");
        assert_eq!(doc.query(&query), Some(save));

        let query = ElementQuery::tag("BUTTON").with_attribute("type", "reset");
        assert_eq!(doc.query(&query), None);
    }

    #[tokio::test]
    async fn test_blocked_popup_opens_nothing() {
        let doc = Arc::new(HeadlessDocument::new(Dimensions::default()));
        let browser = HeadlessBrowser::new(doc, Dimensions::new(800.0, 600.0));
        browser.block_popups(true);

        assert!(browser.open_window("/").is_none());
        assert!(browser.windows().is_empty());
    }
}
