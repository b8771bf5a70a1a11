//! Timed replay of a recorded session into a second window
//!
//! ```text
//!   idle --play--> playing --pause--> paused --play--> playing
//!                     |                                   |
//!                     +--------- last step ---------------+--> completed
//!   stop / closed window / new actions: any --> idle
//! ```
//!
//! Steps are scheduled one at a time on the tokio timer. Every fired timer
//! re-checks that it still belongs to the current run (generation), that
//! playback is active and that the window is still open.

use super::command_player::CommandPlayer;
use crate::capture::ReplayFlag;
use crate::command::Command;
use crate::config::PlayerConfig;
use crate::dom::{BrowserHost, BrowserWindow, ExecutionContext};
use parking_lot::Mutex as ParkingMutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("The browser blocked the replay window. Allow popups for this site and try again.")]
    PopupBlocked,

    #[error("Nothing to replay")]
    NoActions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Completed,
}

type CompletionCallback = Box<dyn Fn() + Send + Sync>;

struct PlayerState {
    status: PlaybackState,
    commands: Arc<Vec<Command>>,
    index: usize,
    window: Option<Arc<dyn BrowserWindow>>,
    pending: Option<JoinHandle<()>>,
    /// Bumped on every transition that invalidates scheduled work
    generation: u64,
}

impl PlayerState {
    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

struct PlayerInner {
    host: Arc<dyn BrowserHost>,
    executor: CommandPlayer,
    replay: ReplayFlag,
    config: PlayerConfig,
    on_complete: Option<CompletionCallback>,
    state: ParkingMutex<PlayerState>,
}

pub struct ReplayPlayer {
    inner: Arc<PlayerInner>,
}

/// Delay before running step `index`
pub fn step_delay(commands: &[Command], index: usize, config: &PlayerConfig) -> Duration {
    let (Some(current), Some(previous)) = (commands.get(index), index.checked_sub(1).and_then(|i| commands.get(i)))
    else {
        return config.default_delay;
    };

    let gap_ms = current.timestamp.saturating_sub(previous.timestamp).max(0) as u64;
    Duration::from_millis(gap_ms).min(config.max_delay)
}

impl ReplayPlayer {
    pub fn new(host: Arc<dyn BrowserHost>, commands: Vec<Command>, replay: ReplayFlag) -> Self {
        Self::builder(host, commands, replay).build()
    }

    pub fn builder(host: Arc<dyn BrowserHost>, commands: Vec<Command>, replay: ReplayFlag) -> ReplayPlayerBuilder {
        ReplayPlayerBuilder {
            host,
            commands,
            replay,
            config: PlayerConfig::default(),
            executor: CommandPlayer::default(),
            on_complete: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.state.lock().status
    }

    /// `(current_index, total_actions)`
    pub fn progress(&self) -> (usize, usize) {
        let state = self.inner.state.lock();
        (state.index, state.commands.len())
    }

    pub fn is_window_open(&self) -> bool {
        self.inner
            .state
            .lock()
            .window
            .as_ref()
            .is_some_and(|window| !window.is_closed())
    }

    /// Start from the beginning, or resume from the current index when
    /// paused. Does nothing while already playing.
    pub async fn play(&self) -> Result<(), ReplayError> {
        let (window, generation) = {
            let mut state = self.inner.state.lock();
            match state.status {
                PlaybackState::Playing => return Ok(()),
                PlaybackState::Paused => {
                    state.status = PlaybackState::Playing;
                    state.generation += 1;
                    self.inner.replay.set(true);
                    tracing::info!("Replay resumed at step {}", state.index);
                    PlayerInner::schedule_next(&self.inner, &mut state);
                    return Ok(());
                }
                PlaybackState::Idle | PlaybackState::Completed => {}
            }

            if state.commands.is_empty() {
                return Err(ReplayError::NoActions);
            }

            // Replaying a completed run starts over in a fresh window
            self.inner.reset(&mut state);

            let window = self
                .inner
                .host
                .open_window(&self.inner.config.start_url)
                .ok_or(ReplayError::PopupBlocked)?;

            state.status = PlaybackState::Playing;
            state.generation += 1;
            state.window = Some(window.clone());
            self.inner.replay.set(true);
            tracing::info!("Replay started with {} actions", state.commands.len());
            (window, state.generation)
        };

        window.wait_for_load().await;

        let mut state = self.inner.state.lock();
        if state.generation == generation && state.status == PlaybackState::Playing {
            PlayerInner::schedule_next(&self.inner, &mut state);
        }
        Ok(())
    }

    /// Suspend after the current step. The window stays open.
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        if state.status != PlaybackState::Playing {
            return;
        }
        state.cancel_pending();
        state.generation += 1;
        state.status = PlaybackState::Paused;
        tracing::info!("Replay paused at step {}", state.index);
    }

    /// Abort playback, close the window and rewind
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        self.inner.reset(&mut state);
        tracing::info!("Replay stopped");
    }

    /// Replace the recorded actions, resetting any playback in progress
    pub fn set_actions(&self, commands: Vec<Command>) {
        let mut state = self.inner.state.lock();
        self.inner.reset(&mut state);
        state.commands = Arc::new(commands);
    }
}

impl Drop for ReplayPlayer {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        self.inner.reset(&mut state);
    }
}

impl PlayerInner {
    /// Back to idle: cancel timers, close the window, lower the flag
    fn reset(&self, state: &mut PlayerState) {
        state.cancel_pending();
        if let Some(window) = state.window.take() {
            if !window.is_closed() {
                window.close();
            }
        }
        state.generation += 1;
        state.index = 0;
        state.status = PlaybackState::Idle;
        self.replay.set(false);
    }

    fn schedule_next(inner: &Arc<PlayerInner>, state: &mut PlayerState) {
        let delay = step_delay(&state.commands, state.index, &inner.config);
        let generation = state.generation;
        let weak = Arc::downgrade(inner);

        state.cancel_pending();
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            PlayerInner::run_step(weak, generation);
        }));
    }

    fn run_step(weak: Weak<PlayerInner>, generation: u64) {
        let Some(inner) = weak.upgrade() else {
            return;
        };

        let completed = {
            let mut state = inner.state.lock();
            if state.generation != generation || state.status != PlaybackState::Playing {
                return;
            }
            // This task is the pending one; it must not abort itself
            state.pending = None;

            let open = state.window.clone().filter(|window| !window.is_closed());
            let Some(window) = open else {
                tracing::warn!("Replay window was closed, stopping playback");
                inner.reset(&mut state);
                return;
            };

            if let Some(command) = state.commands.get(state.index) {
                let document = window.document();
                let ctx = ExecutionContext::new(window.as_ref(), document.as_ref());
                let outcome = inner.executor.execute(command, &ctx);
                tracing::debug!("Replay step {} ({}): {:?}", state.index, command.kind(), outcome);
            }
            state.index += 1;

            if state.index >= state.commands.len() {
                state.status = PlaybackState::Completed;
                state.generation += 1;
                inner.replay.set(false);
                tracing::info!("Replay completed after {} actions", state.index);
                true
            } else {
                PlayerInner::schedule_next(&inner, &mut state);
                false
            }
        };

        if completed {
            if let Some(callback) = &inner.on_complete {
                callback();
            }
        }
    }
}

pub struct ReplayPlayerBuilder {
    host: Arc<dyn BrowserHost>,
    commands: Vec<Command>,
    replay: ReplayFlag,
    config: PlayerConfig,
    executor: CommandPlayer,
    on_complete: Option<CompletionCallback>,
}

impl ReplayPlayerBuilder {
    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn executor(mut self, executor: CommandPlayer) -> Self {
        self.executor = executor;
        self
    }

    pub fn on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> ReplayPlayer {
        ReplayPlayer {
            inner: Arc::new(PlayerInner {
                host: self.host,
                executor: self.executor,
                replay: self.replay,
                config: self.config,
                on_complete: self.on_complete,
                state: ParkingMutex::new(PlayerState {
                    status: PlaybackState::Idle,
                    commands: Arc::new(self.commands),
                    index: 0,
                    window: None,
                    pending: None,
                    generation: 0,
                }),
            }),
        }
    }
}
