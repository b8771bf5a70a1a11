//! Action Replay - record what a user does in a web app and play it back.
//!
//! The capture side turns DOM events into commands, buffers them and uploads
//! compact encoded batches. The replay side loads a session, decodes it and
//! drives a second window through the recorded steps at the
//! pace they were captured.

pub mod capture;
pub mod codec;
pub mod command;
pub mod config;
pub mod dom;
pub mod loader;
pub mod player;
pub mod recorder;
pub mod storage;
pub mod upload;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Calling this more than once is harmless.
pub fn init_tracing() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "action_replay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Action Replay v{}", env!("CARGO_PKG_VERSION"));
    }
}
