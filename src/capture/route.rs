use super::event::DomEvent;
use super::gate::RecordingGate;
use crate::command::Command;
use crate::recorder::buffer::CommandBuffer;
use crate::recorder::channel::{ChannelType, RecordingChannel};
use std::sync::Arc;

pub const DEFAULT_ADMIN_PREFIX: &str = "/admin";

/// Records navigation changes outside the admin area
pub struct RouteRecorder {
    gate: Arc<RecordingGate>,
    buffer: CommandBuffer,
    admin_prefix: String,
}

impl RouteRecorder {
    pub fn new(gate: Arc<RecordingGate>, buffer: CommandBuffer, admin_prefix: impl Into<String>) -> Self {
        Self {
            gate,
            buffer,
            admin_prefix: admin_prefix.into(),
        }
    }

    fn is_admin_path(&self, path: &str) -> bool {
        match path.strip_prefix(self.admin_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
            None => false,
        }
    }
}

impl RecordingChannel for RouteRecorder {
    fn id(&self) -> &str {
        "route"
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Route
    }

    fn handle_event(&self, event: &DomEvent) {
        let DomEvent::RouteChange { path } = event else {
            return;
        };
        if !self.gate.allows_recording() {
            return;
        }
        if self.is_admin_path(path) {
            tracing::debug!("Skipping admin route {}", path);
            return;
        }

        self.buffer.push(Command::route(super::now_ms(), path.clone()));
    }
}
