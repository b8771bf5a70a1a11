//! Replay side: target resolution, command execution and timed playback

pub mod command_player;
pub mod replay;
pub mod selector;

pub use command_player::CommandPlayer;
pub use replay::{step_delay, PlaybackState, ReplayError, ReplayPlayer, ReplayPlayerBuilder};
pub use selector::{looks_like_path, MatchKind, Matcher, SelectorChain};
