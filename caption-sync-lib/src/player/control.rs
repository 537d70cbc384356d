//! Embedded player control channel
//!
//! The player itself is a black box. It is driven by structured command
//! messages and reports back through [`PlayerEvent`]s and a pollable
//! current-time accessor.

use serde::Serialize;

use crate::error::PlayerError;
use crate::types::PlaybackTime;

/// Handle to an embedded player instance.
pub trait Player: Send + Sync + 'static {
    /// Current playback offset, `None` while the player cannot report one.
    fn current_time(&self) -> Option<PlaybackTime>;

    /// Deliver a command message to the player.
    fn send(&self, command: &PlayerCommand) -> Result<(), PlayerError>;

    /// Release the native player. Called exactly once on teardown.
    fn destroy(&self);
}

/// Playback state codes as reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlayerState::Unstarted),
            0 => Some(PlayerState::Ended),
            1 => Some(PlayerState::Playing),
            2 => Some(PlayerState::Paused),
            3 => Some(PlayerState::Buffering),
            5 => Some(PlayerState::Cued),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            PlayerState::Unstarted => -1,
            PlayerState::Ended => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
            PlayerState::Buffering => 3,
            PlayerState::Cued => 5,
        }
    }
}

/// Notifications delivered by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Ready,
    StateChange(PlayerState),
    Error(i32),
}

/// A command message, serialised as
/// `{"event":"command","func":"seekTo","args":[seconds, resume]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerCommand {
    event: &'static str,
    func: &'static str,
    args: Vec<serde_json::Value>,
}

impl PlayerCommand {
    pub fn seek_to(seconds: PlaybackTime, resume: bool) -> Self {
        Self {
            event: "command",
            func: "seekTo",
            args: vec![serde_json::json!(seconds), serde_json::json!(resume)],
        }
    }

    pub fn func(&self) -> &str {
        self.func
    }

    pub fn args(&self) -> &[serde_json::Value] {
        &self.args
    }

    /// Seek target, if this is a seek command
    pub fn seek_target(&self) -> Option<PlaybackTime> {
        (self.func == "seekTo")
            .then(|| self.args.first().and_then(|v| v.as_f64()))
            .flatten()
    }

    /// Wire form handed to the player
    pub fn to_message(&self) -> Result<String, PlayerError> {
        serde_json::to_string(self).map_err(|e| PlayerError::Delivery(e.to_string()))
    }
}
