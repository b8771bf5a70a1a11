//! Browser surface used by the capture and replay paths
//!
//! Recording and replay never touch a concrete DOM. They go through the
//! traits in this module, which a host (a webview bridge, a browser driver,
//! or the [`headless`] implementation) provides.

pub mod headless;

use async_trait::async_trait;
use std::sync::Arc;

/// Attribute carrying the opaque activation identifier of an element
pub const ACTIVATION_ATTRIBUTE: &str = "data-activate-id";

/// Index of an element inside a [`Document`]
pub type NodeId = usize;

/// Width/height pair in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Scrollable extents of a window showing a document
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Full document size (`scrollWidth` / `scrollHeight`)
    pub content: Dimensions,
    /// Visible viewport size (`innerWidth` / `innerHeight`)
    pub viewport: Dimensions,
}

impl ScrollMetrics {
    pub fn new(content: Dimensions, viewport: Dimensions) -> Self {
        Self { content, viewport }
    }

    /// Largest horizontal scroll offset, never negative
    pub fn max_scroll_x(&self) -> f64 {
        (self.content.width - self.viewport.width).max(0.0)
    }

    /// Largest vertical scroll offset, never negative
    pub fn max_scroll_y(&self) -> f64 {
        (self.content.height - self.viewport.height).max(0.0)
    }

    pub fn has_scrollable_extent(&self) -> bool {
        self.max_scroll_x() > 0.0 || self.max_scroll_y() > 0.0
    }

    /// Convert pixel offsets into `[0, 1]` ratios of the scrollable range.
    /// An axis without extent maps to 0.
    pub fn normalize(&self, x: f64, y: f64) -> (f64, f64) {
        (ratio(x, self.max_scroll_x()), ratio(y, self.max_scroll_y()))
    }

    /// Convert `[0, 1]` ratios into pixel offsets for these metrics
    pub fn denormalize(&self, ratio_x: f64, ratio_y: f64) -> (f64, f64) {
        (
            ratio_x.clamp(0.0, 1.0) * self.max_scroll_x(),
            ratio_y.clamp(0.0, 1.0) * self.max_scroll_y(),
        )
    }
}

fn ratio(offset: f64, extent: f64) -> f64 {
    if extent <= 0.0 {
        0.0
    } else {
        (offset / extent).clamp(0.0, 1.0)
    }
}

/// Compound element lookup: optional tag, attribute equalities and
/// trimmed text content. All present parts must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementQuery {
    pub tag: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
}

impl ElementQuery {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().with_attribute(name, value)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Document of a browser window
pub trait Document: Send + Sync {
    /// First element in document order matching the query
    fn query(&self, query: &ElementQuery) -> Option<NodeId>;

    /// Synthesize an activation (click) on an element
    fn click(&self, node: NodeId);

    /// Full scrollable size of the document
    fn scroll_size(&self) -> Dimensions;
}

/// A browser window that replay can drive
#[async_trait]
pub trait BrowserWindow: Send + Sync {
    fn document(&self) -> Arc<dyn Document>;

    fn viewport(&self) -> Dimensions;

    /// Set the window location. Fire and forget.
    fn navigate(&self, path: &str);

    /// Jump to a pixel offset without smooth animation
    fn scroll_to(&self, x: f64, y: f64);

    fn is_closed(&self) -> bool;

    fn close(&self);

    /// Resolves once the initial page load has finished
    async fn wait_for_load(&self);

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics::new(self.document().scroll_size(), self.viewport())
    }
}

/// Opens secondary windows for replay
pub trait BrowserHost: Send + Sync {
    /// `None` when the browser refused to open the window (popup blocked)
    fn open_window(&self, url: &str) -> Option<Arc<dyn BrowserWindow>>;
}

/// The `{window, document}` pair a command executes against
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub window: &'a dyn BrowserWindow,
    pub document: &'a dyn Document,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(window: &'a dyn BrowserWindow, document: &'a dyn Document) -> Self {
        Self { window, document }
    }

    /// Metrics of the target window as they are right now
    pub fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics::new(self.document.scroll_size(), self.window.viewport())
    }
}
