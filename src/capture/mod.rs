//! Capture-side recorders
//!
//! One recorder per action kind. Each checks the shared [`RecordingGate`],
//! applies its own eligibility rules and pushes a command into the buffer.

pub mod activate;
pub mod event;
pub mod gate;
pub mod route;
pub mod scroll;

pub use activate::ActivateRecorder;
pub use event::{DomEvent, EventTarget};
pub use gate::{RecordingGate, ReplayFlag};
pub use route::RouteRecorder;
pub use scroll::ScrollRecorder;

/// Current wall-clock time in epoch milliseconds
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
