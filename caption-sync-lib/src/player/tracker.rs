//! Active cue tracking

use std::sync::Arc;

use crate::error::PlayerError;
use crate::types::{Cue, PlaybackTime, Transcript};

use super::clock::PlaybackClock;

/// Index of the cue active at time `t`: the last cue whose start is at or
/// before `t`. Cues are assumed ordered by start time.
///
/// A cue stays active until the next one starts, regardless of its own
/// duration, so gaps in captions keep the previous line highlighted.
pub fn active_cue_index(cues: &[Cue], t: PlaybackTime) -> Option<usize> {
    let after = cues.partition_point(|cue| cue.start_seconds <= t);
    after.checked_sub(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBlock {
    Start,
    Center,
    Nearest,
}

/// Ask the view to bring a cue line into its visible region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub index: usize,
    pub behavior: ScrollBehavior,
    pub block: ScrollBlock,
}

impl ScrollRequest {
    /// Smooth scroll, centring the line
    pub fn centered(index: usize) -> Self {
        Self {
            index,
            behavior: ScrollBehavior::Smooth,
            block: ScrollBlock::Center,
        }
    }
}

/// The presentation layer, as seen by the session.
///
/// Calls are made without any session lock held.
pub trait ViewSink: Send + Sync + 'static {
    /// Highlight one cue line, or clear the highlight.
    fn highlight(&self, index: Option<usize>);

    fn scroll_into_view(&self, request: ScrollRequest);

    /// The session's load state changed.
    fn load_state_changed(&self, _state: &super::session::LoadState) {}

    /// The player reported a playback error.
    fn player_error(&self, _message: &str) {}
}

/// A change of the active cue, to be rendered by a [`ViewSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChange {
    pub previous: Option<usize>,
    pub current: Option<usize>,
}

impl ActiveChange {
    pub fn apply(&self, view: &dyn ViewSink) {
        view.highlight(self.current);
        if let Some(index) = self.current {
            view.scroll_into_view(ScrollRequest::centered(index));
        }
    }
}

/// Follows playback time over one transcript.
#[derive(Debug, Clone)]
pub struct CueTracker {
    transcript: Arc<Transcript>,
    active: Option<usize>,
}

impl CueTracker {
    pub fn new(transcript: Arc<Transcript>) -> Self {
        Self {
            transcript,
            active: None,
        }
    }

    pub fn transcript(&self) -> &Arc<Transcript> {
        &self.transcript
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_cue(&self) -> Option<&Cue> {
        self.active.and_then(|i| self.transcript.get(i))
    }

    /// Recompute the active cue for a clock tick. Returns the change only
    /// when the index actually moved.
    pub fn on_tick(&mut self, t: PlaybackTime) -> Option<ActiveChange> {
        let current = active_cue_index(&self.transcript, t);
        if current == self.active {
            return None;
        }
        let previous = std::mem::replace(&mut self.active, current);
        Some(ActiveChange { previous, current })
    }

    /// Start time of the cue at `index`.
    pub fn cue_start(&self, index: usize) -> Result<PlaybackTime, PlayerError> {
        self.transcript
            .get(index)
            .map(|cue| cue.start_seconds)
            .ok_or(PlayerError::CueOutOfRange {
                index,
                len: self.transcript.len(),
            })
    }

    /// Seek the player to a cue and resume play. The active index is left
    /// alone; the next tick picks up the new position.
    pub fn select(&self, index: usize, clock: &PlaybackClock) -> Result<(), PlayerError> {
        let start = self.cue_start(index)?;
        clock.seek(start, true)
    }
}
