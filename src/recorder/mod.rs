//! Capture session coordination
//!
//! A [`CaptureSession`] lives for one page/tab. It owns the command buffer
//! and the recorder channels, and fans every DOM event out to them.

pub mod buffer;
pub mod channel;

pub use buffer::{BufferConfig, CommandBuffer};
pub use channel::{ChannelType, RecordingChannel};

use crate::capture::{ActivateRecorder, DomEvent, RecordingGate, ReplayFlag, RouteRecorder, ScrollRecorder};
use crate::config::ReplayConfig;
use crate::upload::Uploader;
use std::sync::Arc;
use uuid::Uuid;

pub struct CaptureSession {
    gate: Arc<RecordingGate>,
    buffer: CommandBuffer,
    channels: Vec<Box<dyn RecordingChannel>>,
}

impl CaptureSession {
    /// Build the buffer and the recorders enabled by `config`.
    ///
    /// The scroll recorder only exists when a scroll threshold is set.
    /// `replay` is shared with the replay player so a running replay is not
    /// recorded.
    pub fn new(config: &ReplayConfig, uploader: Arc<dyn Uploader>, replay: ReplayFlag) -> Self {
        let gate = Arc::new(RecordingGate::new(config.enabled, replay));
        let buffer = CommandBuffer::new(uploader, config.buffer_config());

        let mut session = Self {
            gate: gate.clone(),
            buffer: buffer.clone(),
            channels: Vec::new(),
        };
        session.add_channel(Box::new(RouteRecorder::new(
            gate.clone(),
            buffer.clone(),
            config.admin_prefix.clone(),
        )));
        session.add_channel(Box::new(ActivateRecorder::new(gate.clone(), buffer.clone())));
        if let Some(threshold) = config.scroll_threshold {
            session.add_channel(Box::new(ScrollRecorder::new(
                gate,
                buffer,
                threshold,
                config.scroll_debounce(),
            )));
        }

        session
    }

    pub fn add_channel(&mut self, channel: Box<dyn RecordingChannel>) {
        tracing::debug!("Added {} recording channel", channel.channel_type());
        self.channels.push(channel);
    }

    pub fn channel_types(&self) -> Vec<ChannelType> {
        self.channels.iter().map(|c| c.channel_type()).collect()
    }

    pub fn gate(&self) -> &RecordingGate {
        &self.gate
    }

    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    /// Pre-create the session id and start the periodic flush
    pub fn init(&self) -> Uuid {
        let session_id = self.buffer.init();
        self.buffer.start();
        tracing::info!(
            "Capture session {} initialized with {} channels",
            session_id,
            self.channels.len()
        );
        session_id
    }

    pub fn handle_event(&self, event: &DomEvent) {
        for channel in &self.channels {
            channel.handle_event(event);
        }
    }

    /// Best-effort flush when the page goes away
    pub async fn unload(&self) -> bool {
        let persisted = self.buffer.unload().await;
        if !persisted {
            tracing::warn!("{} actions not persisted at unload", self.buffer.len());
        }
        persisted
    }
}
