//! Compact wire encoding for recorded actions
//!
//! Actions are stored with short type codes and short payload keys to keep
//! upload batches small. Both lookup tables are fixed and bidirectional.
//! Anything the tables do not know about passes through unchanged, so newer
//! and older clients can still read each other's data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action type names and their wire codes
const TYPE_CODES: &[(&str, &str)] = &[
    ("route", "r"),
    ("click", "c"),
    ("input", "i"),
    ("submit", "s"),
    ("component", "m"),
    ("api_call", "a"),
    ("error", "e"),
];

/// Payload keys and their wire codes
const KEY_CODES: &[(&str, &str)] = &[
    ("path", "p"),
    ("target", "tg"),
    ("selector", "s"),
    ("component", "c"),
    ("field", "f"),
    ("value", "v"),
    ("name", "n"),
    ("props", "pr"),
    ("userId", "u"),
];

/// A recorded action in its readable, pre-wire form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub data: Map<String, Value>,
}

/// Wire and storage form of an [`Action`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedAction {
    pub t: String,
    pub ts: i64,
    pub d: Map<String, Value>,
}

impl Action {
    pub fn new(kind: impl Into<String>, timestamp: i64, data: Map<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            data,
        }
    }
}

/// Shrink an action to its wire form
pub fn encode(action: &Action) -> EncodedAction {
    EncodedAction {
        t: to_code(TYPE_CODES, &action.kind),
        ts: action.timestamp,
        d: map_keys(&action.data, &|key| to_code(KEY_CODES, key)),
    }
}

/// Expand a wire action back into its readable form
pub fn decode(encoded: &EncodedAction) -> Action {
    Action {
        kind: from_code(TYPE_CODES, &encoded.t),
        timestamp: encoded.ts,
        data: map_keys(&encoded.d, &|key| from_code(KEY_CODES, key)),
    }
}

fn to_code(table: &[(&str, &str)], name: &str) -> String {
    table
        .iter()
        .find(|(long, _)| *long == name)
        .map(|(_, code)| (*code).to_string())
        .unwrap_or_else(|| name.to_string())
}

fn from_code(table: &[(&str, &str)], code: &str) -> String {
    table
        .iter()
        .find(|(_, short)| *short == code)
        .map(|(long, _)| (*long).to_string())
        .unwrap_or_else(|| code.to_string())
}

fn map_keys(data: &Map<String, Value>, rename: &dyn Fn(&str) -> String) -> Map<String, Value> {
    data.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(nested) => Value::Object(map_keys(nested, rename)),
                other => other.clone(),
            };
            (rename(key), value)
        })
        .collect()
}
