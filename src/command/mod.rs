//! Replayable commands
//!
//! A command is one recorded user action (route change, activation, scroll)
//! together with the operation that performs it again against a window.

pub mod types;

pub use types::{ActivatePayload, ExecutionOutcome, RoutePayload, ScrollPayload};

use crate::codec::Action;
use crate::dom::{ElementQuery, ExecutionContext, ACTIVATION_ATTRIBUTE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Action type names as they appear in the pre-wire form
pub mod kind {
    pub const ROUTE: &str = "route";
    /// Activations travel under the `click` wire type
    pub const ACTIVATE: &str = "click";
    pub const SCROLL: &str = "scroll";
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unsupported action type: {0}")]
    Unsupported(String),

    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Route(RoutePayload),
    Activate(ActivatePayload),
    Scroll(ScrollPayload),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Epoch milliseconds at capture time
    pub timestamp: i64,
    pub payload: Payload,
}

impl Command {
    pub fn route(timestamp: i64, path: impl Into<String>) -> Self {
        Self {
            timestamp,
            payload: Payload::Route(RoutePayload { path: path.into() }),
        }
    }

    pub fn activate(timestamp: i64, selector: impl Into<String>) -> Self {
        Self {
            timestamp,
            payload: Payload::Activate(ActivatePayload {
                selector: selector.into(),
                target: None,
            }),
        }
    }

    pub fn activate_with_target(
        timestamp: i64,
        selector: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            payload: Payload::Activate(ActivatePayload {
                selector: selector.into(),
                target: Some(target.into()),
            }),
        }
    }

    pub fn scroll(timestamp: i64, scroll_y: f64, scroll_x: f64) -> Self {
        Self {
            timestamp,
            payload: Payload::Scroll(ScrollPayload::new(scroll_y, scroll_x)),
        }
    }

    /// Pre-wire action type name
    pub fn kind(&self) -> &'static str {
        match self.payload {
            Payload::Route(_) => kind::ROUTE,
            Payload::Activate(_) => kind::ACTIVATE,
            Payload::Scroll(_) => kind::SCROLL,
        }
    }

    pub fn to_action(&self) -> Action {
        let data = match &self.payload {
            Payload::Route(payload) => to_map(payload),
            Payload::Activate(payload) => to_map(payload),
            Payload::Scroll(payload) => to_map(payload),
        };
        Action::new(self.kind(), self.timestamp, data)
    }

    /// Perform the command against the target window
    pub fn execute(&self, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        match &self.payload {
            Payload::Route(route) => {
                ctx.window.navigate(&route.path);
                ExecutionOutcome::Navigated(route.path.clone())
            }
            Payload::Activate(activate) => {
                let query = ElementQuery::attribute(ACTIVATION_ATTRIBUTE, activate.selector.as_str());
                match ctx.document.query(&query) {
                    Some(node) => {
                        ctx.document.click(node);
                        ExecutionOutcome::Activated(node)
                    }
                    None => {
                        tracing::debug!("No element tagged {:?}, skipping", activate.selector);
                        ExecutionOutcome::Skipped
                    }
                }
            }
            Payload::Scroll(scroll) => {
                let (x, y) = ctx
                    .scroll_metrics()
                    .denormalize(scroll.scroll_x, scroll.scroll_y);
                ctx.window.scroll_to(x, y);
                ExecutionOutcome::Scrolled { x, y }
            }
        }
    }
}

impl TryFrom<Action> for Command {
    type Error = CommandError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        let payload = match action.kind.as_str() {
            kind::ROUTE => Payload::Route(from_map(&action.kind, action.data)?),
            kind::ACTIVATE => Payload::Activate(from_map(&action.kind, action.data)?),
            kind::SCROLL => {
                let raw: ScrollPayload = from_map(&action.kind, action.data)?;
                Payload::Scroll(ScrollPayload::new(raw.scroll_y, raw.scroll_x))
            }
            other => return Err(CommandError::Unsupported(other.to_string())),
        };

        Ok(Self {
            timestamp: action.timestamp,
            payload,
        })
    }
}

fn to_map<T: Serialize>(payload: &T) -> Map<String, Value> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn from_map<T: DeserializeOwned>(kind: &str, data: Map<String, Value>) -> Result<T, CommandError> {
    serde_json::from_value(Value::Object(data)).map_err(|source| CommandError::InvalidPayload {
        kind: kind.to_string(),
        source,
    })
}
