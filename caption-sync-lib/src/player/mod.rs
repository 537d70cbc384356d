//! Playback synchronisation: the player control channel, the polling
//! clock, cue tracking and the session that ties them together.

mod clock;
mod control;
mod session;
mod tracker;

pub use clock::{PlaybackClock, TaskGuard, DEFAULT_POLL_INTERVAL};
pub use control::{Player, PlayerCommand, PlayerEvent, PlayerState};
pub use session::{
    LoadOutcome, LoadState, SessionContext, SessionOptions, ViewingSession, PLAYER_ERROR_MESSAGE,
};
pub use tracker::{
    active_cue_index, ActiveChange, CueTracker, ScrollBehavior, ScrollBlock, ScrollRequest,
    ViewSink,
};
