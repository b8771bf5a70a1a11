use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePayload {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivatePayload {
    /// Activation identifier of the element
    pub selector: String,
    /// Optional descriptive target used by the replay selector chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Scroll position as ratios of the scrollable range, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPayload {
    pub scroll_y: f64,
    pub scroll_x: f64,
}

impl ScrollPayload {
    pub fn new(scroll_y: f64, scroll_x: f64) -> Self {
        Self {
            scroll_y: clamp_ratio(scroll_y),
            scroll_x: clamp_ratio(scroll_x),
        }
    }
}

fn clamp_ratio(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// What executing a command did
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Navigated(String),
    Activated(usize),
    Scrolled { x: f64, y: f64 },
    /// Nothing matched; replay carries on
    Skipped,
}
