use super::event::DomEvent;
use super::gate::RecordingGate;
use crate::command::Command;
use crate::recorder::buffer::CommandBuffer;
use crate::recorder::channel::{ChannelType, RecordingChannel};
use parking_lot::Mutex as ParkingMutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_SCROLL_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Default)]
struct ScrollState {
    /// Last recorded `(x, y)` ratios
    last_recorded: (f64, f64),
    debounce: Option<JoinHandle<()>>,
    /// Bumped per event; only the newest debounce task may commit
    seq: u64,
}

struct ScrollInner {
    gate: Arc<RecordingGate>,
    buffer: CommandBuffer,
    /// Minimum change on either axis, as a ratio of the scrollable range
    threshold: f64,
    state: ParkingMutex<ScrollState>,
}

impl ScrollInner {
    fn commit(&self, seq: u64, ratio_x: f64, ratio_y: f64) {
        let mut state = self.state.lock();
        if state.seq != seq {
            return;
        }
        state.debounce = None;

        let (last_x, last_y) = state.last_recorded;
        let moved = (ratio_x - last_x).abs() >= self.threshold || (ratio_y - last_y).abs() >= self.threshold;
        if !moved {
            tracing::debug!("Scroll delta below {} ignored", self.threshold);
            return;
        }
        // Replay may have started while the debounce was pending
        if !self.gate.allows_recording() {
            return;
        }

        state.last_recorded = (ratio_x, ratio_y);
        drop(state);
        self.buffer.push(Command::scroll(super::now_ms(), ratio_y, ratio_x));
    }
}

/// Records settled scroll positions as ratios of the scrollable range
///
/// Bursts of scroll events are debounced; only the position the page comes
/// to rest at is recorded. Must be used from within a tokio runtime.
pub struct ScrollRecorder {
    inner: Arc<ScrollInner>,
    debounce: Duration,
}

impl ScrollRecorder {
    pub fn new(gate: Arc<RecordingGate>, buffer: CommandBuffer, threshold: f64, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(ScrollInner {
                gate,
                buffer,
                threshold,
                state: ParkingMutex::new(ScrollState::default()),
            }),
            debounce,
        }
    }
}

impl RecordingChannel for ScrollRecorder {
    fn id(&self) -> &str {
        "scroll"
    }

    fn channel_type(&self) -> ChannelType {
        ChannelType::Scroll
    }

    fn handle_event(&self, event: &DomEvent) {
        let DomEvent::Scroll {
            scroll_x,
            scroll_y,
            metrics,
        } = event
        else {
            return;
        };
        if !self.inner.gate.allows_recording() || !metrics.has_scrollable_extent() {
            return;
        }

        let (ratio_x, ratio_y) = metrics.normalize(*scroll_x, *scroll_y);
        let inner = Arc::downgrade(&self.inner);
        let delay = self.debounce;

        let mut state = self.inner.state.lock();
        if let Some(previous) = state.debounce.take() {
            previous.abort();
        }
        state.seq = state.seq.wrapping_add(1);
        let seq = state.seq;
        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.commit(seq, ratio_x, ratio_y);
            }
        }));
    }
}

impl Drop for ScrollRecorder {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.state.lock().debounce.take() {
            handle.abort();
        }
    }
}
