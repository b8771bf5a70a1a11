//! Per-tab command buffer
//!
//! Recorders push commands synchronously. The buffer encodes them, queues
//! them and hands batches to the [`Uploader`] on a fixed interval, when the
//! queue reaches a size threshold, and once more on unload. A failed batch
//! goes back to the front of the queue so the next flush retries it.

use crate::codec::{encode, EncodedAction};
use crate::command::Command;
use crate::upload::Uploader;
use parking_lot::Mutex as ParkingMutex;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_FLUSH_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub flush_interval: Duration,
    /// Queue length that triggers an immediate flush
    pub flush_threshold: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }
}

#[derive(Default)]
struct BufferState {
    queue: VecDeque<EncodedAction>,
    session_id: Option<Uuid>,
}

impl BufferState {
    fn ensure_session(&mut self) -> Uuid {
        *self.session_id.get_or_insert_with(|| {
            let id = Uuid::new_v4();
            tracing::info!("Started replay session {}", id);
            id
        })
    }
}

struct BufferInner {
    config: BufferConfig,
    uploader: Arc<dyn Uploader>,
    state: ParkingMutex<BufferState>,
    ticker: ParkingMutex<Option<JoinHandle<()>>>,
    /// Held for the whole drain-upload-requeue cycle; one batch in flight
    flush_lock: tokio::sync::Mutex<()>,
}

impl Drop for BufferInner {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}

/// Cheaply cloneable handle to one tab's buffer
#[derive(Clone)]
pub struct CommandBuffer {
    inner: Arc<BufferInner>,
}

impl CommandBuffer {
    pub fn new(uploader: Arc<dyn Uploader>, config: BufferConfig) -> Self {
        Self {
            inner: Arc::new(BufferInner {
                config,
                uploader,
                state: ParkingMutex::new(BufferState::default()),
                ticker: ParkingMutex::new(None),
                flush_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Create the session id up front so every recorder shares it
    pub fn init(&self) -> Uuid {
        self.inner.state.lock().ensure_session()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.inner.state.lock().session_id
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the queued actions, oldest first
    pub fn pending(&self) -> Vec<EncodedAction> {
        self.inner.state.lock().queue.iter().cloned().collect()
    }

    /// Queue a command. Never blocks on the network.
    ///
    /// Reaching the flush threshold spawns a flush on the current tokio
    /// runtime.
    pub fn push(&self, command: Command) {
        let encoded = encode(&command.to_action());
        let queued = {
            let mut state = self.inner.state.lock();
            state.ensure_session();
            state.queue.push_back(encoded);
            state.queue.len()
        };

        if queued >= self.inner.config.flush_threshold {
            tracing::debug!("Buffer reached {} actions, flushing", queued);
            let buffer = self.clone();
            tokio::spawn(async move {
                buffer.flush_if_idle().await;
            });
        }
    }

    /// Drain the queue and upload it as one batch.
    ///
    /// Returns `true` when the batch was persisted or there was nothing to
    /// send. On failure the batch is put back ahead of anything queued while
    /// the upload was in flight. Waits for an upload already in flight.
    pub async fn flush(&self) -> bool {
        let _guard = self.inner.flush_lock.lock().await;
        self.flush_locked().await
    }

    /// Threshold and interval flushes: skipped while a batch is in flight
    async fn flush_if_idle(&self) {
        let Ok(_guard) = self.inner.flush_lock.try_lock() else {
            tracing::debug!("Upload in flight, skipping flush");
            return;
        };
        self.flush_locked().await;
    }

    async fn flush_locked(&self) -> bool {
        let (session_id, batch) = {
            let mut state = self.inner.state.lock();
            if state.queue.is_empty() {
                return true;
            }
            let session_id = state.ensure_session();
            let batch: Vec<EncodedAction> = state.queue.drain(..).collect();
            (session_id, batch)
        };

        match self.inner.uploader.upload(session_id, &batch).await {
            Ok(()) => {
                tracing::debug!("Flushed {} actions for session {}", batch.len(), session_id);
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Flush of {} actions failed, requeueing: {}",
                    batch.len(),
                    e
                );
                let mut state = self.inner.state.lock();
                for action in batch.into_iter().rev() {
                    state.queue.push_front(action);
                }
                false
            }
        }
    }

    /// Start the periodic flush. Calling it again is a no-op.
    pub fn start(&self) {
        let mut ticker = self.inner.ticker.lock();
        if ticker.is_some() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.flush_interval;
        if period.is_zero() {
            tracing::warn!("Flush interval is zero, periodic flush disabled");
            return;
        }
        *ticker = Some(tokio::spawn(run_ticker(weak, period)));
        tracing::debug!("Flush ticker started (interval={:?})", period);
    }

    /// Stop the ticker and make one last attempt to persist the queue
    pub async fn unload(&self) -> bool {
        if let Some(handle) = self.inner.ticker.lock().take() {
            handle.abort();
        }
        self.flush().await
    }
}

async fn run_ticker(weak: Weak<BufferInner>, period: Duration) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        interval.tick().await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        CommandBuffer { inner }.flush_if_idle().await;
    }
}
