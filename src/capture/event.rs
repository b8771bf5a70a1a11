use crate::dom::ScrollMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of one element on an event's propagation path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTarget {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

impl EventTarget {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether a user can activate this element with pointer or keyboard
    pub fn is_interactive(&self) -> bool {
        match self.tag.as_str() {
            "button" | "input" | "select" | "textarea" | "summary" => return true,
            "a" if self.attributes.contains_key("href") => return true,
            _ => {}
        }
        matches!(self.attr("role"), Some("button") | Some("link"))
            || self.attributes.contains_key("tabindex")
    }
}

/// DOM events the recorders listen to
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    RouteChange {
        path: String,
    },
    /// Click observed in the capture phase at the document root.
    /// `composed_path` runs from the event target up to the root.
    Click {
        composed_path: Vec<EventTarget>,
    },
    KeyDown {
        key: String,
        composed_path: Vec<EventTarget>,
    },
    Scroll {
        scroll_x: f64,
        scroll_y: f64,
        metrics: ScrollMetrics,
    },
}
