use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raised while a replay drives a window, so live recorders ignore what
/// the replay does.
#[derive(Debug, Clone, Default)]
pub struct ReplayFlag(Arc<AtomicBool>);

impl ReplayFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, replaying: bool) {
        self.0.store(replaying, Ordering::SeqCst);
    }

    pub fn is_replaying(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Conditions every recorder checks before recording anything
#[derive(Debug)]
pub struct RecordingGate {
    enabled: bool,
    user_id: RwLock<Option<String>>,
    replay: ReplayFlag,
}

impl RecordingGate {
    pub fn new(enabled: bool, replay: ReplayFlag) -> Self {
        Self {
            enabled,
            user_id: RwLock::new(None),
            replay,
        }
    }

    /// Set or clear the signed-in user
    pub fn set_user(&self, user_id: Option<String>) {
        *self.user_id.write() = user_id;
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id.read().clone()
    }

    pub fn replay_flag(&self) -> &ReplayFlag {
        &self.replay
    }

    pub fn allows_recording(&self) -> bool {
        self.enabled && self.user_id.read().is_some() && !self.replay.is_replaying()
    }
}
