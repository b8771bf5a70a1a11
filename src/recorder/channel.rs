//! Recording channel trait
//!
//! Defines the interface shared by the route, activation and scroll
//! recorders.

use crate::capture::event::DomEvent;

/// Trait for recording channels
///
/// Each channel turns one kind of DOM event into commands for the buffer.
/// Channels are driven by the `CaptureSession`, which forwards every event
/// to every channel; a channel ignores events it does not handle.
pub trait RecordingChannel: Send + Sync {
    /// Get the channel identifier (e.g., "route", "activate", "scroll")
    fn id(&self) -> &str;

    /// Get the channel type
    fn channel_type(&self) -> ChannelType;

    /// Inspect an event and record a command if it qualifies.
    /// Never blocks and never fails; ineligible events are dropped.
    fn handle_event(&self, event: &DomEvent);
}

/// Types of recording channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    /// Route/navigation changes
    Route,
    /// Clicks and keyboard activation
    Activate,
    /// Settled scroll positions
    Scroll,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelType::Route => write!(f, "route"),
            ChannelType::Activate => write!(f, "activate"),
            ChannelType::Scroll => write!(f, "scroll"),
        }
    }
}
