//! Recording and replay configuration
//!
//! Values come from an optional JSON file, then environment overrides.
//! Every field has a default so a missing file is not an error.

use crate::capture::route::DEFAULT_ADMIN_PREFIX;
use crate::capture::scroll::DEFAULT_SCROLL_DEBOUNCE;
use crate::recorder::buffer::{BufferConfig, DEFAULT_FLUSH_INTERVAL, DEFAULT_FLUSH_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scroll threshold must be in (0, 1], got {0}")]
    InvalidScrollThreshold(f64),

    #[error("Flush interval must be greater than zero")]
    ZeroFlushInterval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayConfig {
    /// Master switch for recording
    pub enabled: bool,
    /// Minimum normalized scroll change worth recording. `None` disables
    /// scroll recording entirely.
    pub scroll_threshold: Option<f64>,
    /// How long sessions are kept. Enforced by storage, not here.
    pub retention_days: u32,
    /// CSS selectors whose content should be redacted. Parsed but not yet
    /// applied by the recorders.
    pub redact_selectors: Vec<String>,
    pub admin_prefix: String,
    pub flush_interval_ms: u64,
    pub flush_threshold: usize,
    pub scroll_debounce_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scroll_threshold: None,
            retention_days: 30,
            redact_selectors: Vec::new(),
            admin_prefix: DEFAULT_ADMIN_PREFIX.to_string(),
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            scroll_debounce_ms: DEFAULT_SCROLL_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl ReplayConfig {
    /// Read a JSON config file and apply environment overrides.
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::ZeroFlushInterval);
        }
        match self.scroll_threshold {
            Some(t) if !(t > 0.0 && t <= 1.0) => Err(ConfigError::InvalidScrollThreshold(t)),
            _ => Ok(()),
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("REPLAY_ENABLED") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.enabled = true,
                "0" | "false" | "no" | "off" => self.enabled = false,
                other => tracing::warn!("invalid REPLAY_ENABLED {:?}, ignoring", other),
            }
        }

        if let Ok(raw) = std::env::var("REPLAY_SCROLL_THRESHOLD") {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                match trimmed.parse::<f64>() {
                    Ok(value) if value > 0.0 && value <= 1.0 => self.scroll_threshold = Some(value),
                    Ok(value) => {
                        tracing::warn!("REPLAY_SCROLL_THRESHOLD {} out of range, ignoring", value)
                    }
                    Err(err) => tracing::warn!("invalid REPLAY_SCROLL_THRESHOLD, ignoring: {err}"),
                }
            }
        }

        if let Ok(raw) = std::env::var("REPLAY_RETENTION_DAYS") {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                match trimmed.parse::<u32>() {
                    Ok(value) => self.retention_days = value,
                    Err(err) => tracing::warn!("invalid REPLAY_RETENTION_DAYS, ignoring: {err}"),
                }
            }
        }

        if let Ok(raw) = std::env::var("REPLAY_REDACT_SELECTORS") {
            self.redact_selectors = parse_selector_list(&raw);
        }
    }

    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig {
            flush_interval: Duration::from_millis(self.flush_interval_ms),
            flush_threshold: self.flush_threshold.max(1),
        }
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }
}

fn parse_selector_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub const DEFAULT_START_URL: &str = "/";
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);
pub const MAX_STEP_DELAY: Duration = Duration::from_millis(5_000);

/// Replay timing and target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// URL the replay window opens at
    pub start_url: String,
    /// Delay before a step without a timing reference
    pub default_delay: Duration,
    /// Upper bound on the delay between two steps
    pub max_delay: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            default_delay: DEFAULT_STEP_DELAY,
            max_delay: MAX_STEP_DELAY,
        }
    }
}
