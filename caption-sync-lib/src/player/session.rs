//! Viewing session
//!
//! Ties one transcript request, one player and one cue tracker together.
//! Every `load` bumps a generation counter; a result whose generation is no
//! longer current is dropped, so a slow earlier request can never overwrite
//! the transcript of a later one. Loading a new video also tears down the
//! previous player before anything else happens.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::{PlaybackClock, TaskGuard, DEFAULT_POLL_INTERVAL};
use super::control::{Player, PlayerEvent};
use super::tracker::{ActiveChange, CueTracker, ViewSink};
use crate::error::{CaptionError, PlayerError};
use crate::identifier::resolve_identifier;
use crate::service::{Method, Quality, TranscriptRequest, TranscriptSource};
use crate::types::{PlaybackTime, Transcript, VideoId};

/// Message surfaced when the player itself fails
pub const PLAYER_ERROR_MESSAGE: &str = "This video may be unavailable or restricted";

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    pub quality: Quality,
    pub method: Method,
    pub api_key: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            quality: Quality::default(),
            method: Method::default(),
            api_key: None,
        }
    }
}

/// Everything a session needs from its surroundings
#[derive(Clone)]
pub struct SessionContext {
    pub session_id: Uuid,
    pub view: Arc<dyn ViewSink>,
    pub options: SessionOptions,
}

impl SessionContext {
    pub fn new(view: Arc<dyn ViewSink>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            view,
            options: SessionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }
}

/// What the transcript pane shows. Exactly one of these at a time: there is
/// never a transcript and an error on screen together.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading {
        video_id: VideoId,
    },
    Ready {
        video_id: VideoId,
        transcript: Arc<Transcript>,
    },
    /// Extraction succeeded but the track had no cues
    Empty {
        video_id: VideoId,
    },
    Failed {
        /// Short message for the user
        message: String,
        /// Diagnostic detail
        detail: String,
        retryable: bool,
    },
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading { .. })
    }

    pub fn transcript(&self) -> Option<&Arc<Transcript>> {
        match self {
            LoadState::Ready { transcript, .. } => Some(transcript),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    fn failed(error: &CaptionError, detail: String) -> Self {
        LoadState::Failed {
            message: error.user_message().to_string(),
            detail,
            retryable: error.is_retryable(),
        }
    }
}

/// Result of a `load` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result became the session's state
    Applied,
    /// A newer load started meanwhile; the result was discarded
    Superseded,
}

struct AttachedPlayer {
    clock: Arc<PlaybackClock>,
    _follower: TaskGuard,
}

impl Drop for AttachedPlayer {
    fn drop(&mut self) {
        self.clock.teardown();
    }
}

struct Inner {
    generation: u64,
    video_id: Option<VideoId>,
    state: LoadState,
    tracker: Option<CueTracker>,
    player: Option<AttachedPlayer>,
    player_error: Option<String>,
}

/// One user's view: a transcript, a player and the highlight that follows
/// playback.
pub struct ViewingSession<S: TranscriptSource> {
    context: SessionContext,
    source: Arc<S>,
    inner: Mutex<Inner>,
}

impl<S: TranscriptSource> ViewingSession<S> {
    pub fn new(context: SessionContext, source: Arc<S>) -> Arc<Self> {
        Arc::new(Self {
            context,
            source,
            inner: Mutex::new(Inner {
                generation: 0,
                video_id: None,
                state: LoadState::Idle,
                tracker: None,
                player: None,
                player_error: None,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.context.session_id
    }

    pub fn state(&self) -> LoadState {
        self.inner.lock().state.clone()
    }

    pub fn video_id(&self) -> Option<VideoId> {
        self.inner.lock().video_id.clone()
    }

    pub fn active_cue(&self) -> Option<usize> {
        self.inner.lock().tracker.as_ref().and_then(|t| t.active())
    }

    pub fn player_error(&self) -> Option<String> {
        self.inner.lock().player_error.clone()
    }

    pub fn has_player(&self) -> bool {
        self.inner.lock().player.is_some()
    }

    /// Full transcript text for copying, if one is loaded.
    pub fn copy_text(&self) -> Option<String> {
        self.inner
            .lock()
            .state
            .transcript()
            .map(|t| t.full_text())
    }

    /// Resolve `input` and fetch its transcript.
    ///
    /// Any previous player and transcript are discarded first.
    pub async fn load(&self, input: &str) -> LoadOutcome {
        let video_id = match resolve_identifier(input) {
            Ok(id) => id,
            Err(e) => {
                debug!(session = %self.id(), error = %e, "rejected input");
                let state = LoadState::failed(&e, e.to_string());
                self.reset(None, state);
                return LoadOutcome::Applied;
            }
        };

        let generation = self.reset(
            Some(video_id.clone()),
            LoadState::Loading {
                video_id: video_id.clone(),
            },
        );
        info!(session = %self.id(), video_id = %video_id, generation, "loading transcript");

        let options = &self.context.options;
        let request = TranscriptRequest::new(video_id.clone())
            .with_quality(options.quality)
            .with_method(options.method)
            .with_api_key(options.api_key.clone());
        let result = self.source.fetch_transcript(request).await;

        let state = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                debug!(
                    session = %self.id(),
                    video_id = %video_id,
                    generation,
                    current = inner.generation,
                    "discarding superseded transcript result"
                );
                return LoadOutcome::Superseded;
            }

            inner.state = match result {
                Ok(transcript) if transcript.is_empty() => LoadState::Empty {
                    video_id: video_id.clone(),
                },
                Ok(transcript) => {
                    let transcript = Arc::new(transcript);
                    inner.tracker = Some(CueTracker::new(Arc::clone(&transcript)));
                    LoadState::Ready {
                        video_id: video_id.clone(),
                        transcript,
                    }
                }
                Err(e) => {
                    warn!(session = %self.id(), video_id = %video_id, error = %e, "transcript load failed");
                    LoadState::failed(&e.error, e.to_string())
                }
            };
            inner.state.clone()
        };

        self.context.view.load_state_changed(&state);
        LoadOutcome::Applied
    }

    /// Start a new generation with the given state, tearing down the player.
    fn reset(&self, video_id: Option<VideoId>, state: LoadState) -> u64 {
        let (generation, previous_player) = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.video_id = video_id;
            inner.state = state.clone();
            inner.tracker = None;
            inner.player_error = None;
            (inner.generation, inner.player.take())
        };
        drop(previous_player);

        self.context.view.highlight(None);
        self.context.view.load_state_changed(&state);
        generation
    }

    /// Clear a displayed load error.
    pub fn dismiss_error(&self) {
        let state = {
            let mut inner = self.inner.lock();
            inner.player_error = None;
            if !matches!(inner.state, LoadState::Failed { .. }) {
                return;
            }
            inner.state = LoadState::Idle;
            inner.state.clone()
        };
        self.context.view.load_state_changed(&state);
    }

    /// Attach the player created for the current video and start following
    /// its clock. Replaces any player already attached.
    pub fn attach_player(self: &Arc<Self>, player: Arc<dyn Player>) -> Result<(), PlayerError> {
        let mut inner = self.inner.lock();
        if inner.video_id.is_none() {
            return Err(PlayerError::NotReady);
        }

        let clock = Arc::new(PlaybackClock::new(player, self.context.options.poll_interval));
        let mut ticks = clock.subscribe();
        let session: Weak<Self> = Arc::downgrade(self);
        let follower = TaskGuard::spawn(move |cancel| async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = ticks.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let t = *ticks.borrow_and_update();
                        match session.upgrade() {
                            Some(session) => session.tick(t),
                            None => break,
                        }
                    }
                }
            }
        });

        let previous = inner.player.replace(AttachedPlayer {
            clock,
            _follower: follower,
        });
        drop(inner);
        drop(previous);
        debug!(session = %self.id(), "player attached");
        Ok(())
    }

    /// Forward a player notification.
    pub fn handle_player_event(&self, event: PlayerEvent) {
        let clock = {
            let mut inner = self.inner.lock();
            let Some(attached) = inner.player.as_ref() else {
                return;
            };
            let clock = Arc::clone(&attached.clock);
            if let PlayerEvent::Error(code) = event {
                warn!(session = %self.id(), code, "player error");
                inner.player_error = Some(PLAYER_ERROR_MESSAGE.to_string());
            }
            clock
        };

        clock.handle_event(event);
        if matches!(event, PlayerEvent::Error(_)) {
            self.context.view.player_error(PLAYER_ERROR_MESSAGE);
        }
    }

    /// Apply one clock tick.
    pub fn tick(&self, t: PlaybackTime) {
        let change: Option<ActiveChange> = {
            let mut inner = self.inner.lock();
            inner.tracker.as_mut().and_then(|tracker| tracker.on_tick(t))
        };
        if let Some(change) = change {
            change.apply(self.context.view.as_ref());
        }
    }

    /// Seek to a cue chosen by the user.
    pub fn select_cue(&self, index: usize) -> Result<(), PlayerError> {
        let (start, clock) = {
            let inner = self.inner.lock();
            let tracker = inner.tracker.as_ref().ok_or(PlayerError::NoTranscript)?;
            let attached = inner.player.as_ref().ok_or(PlayerError::NotReady)?;
            (tracker.cue_start(index)?, Arc::clone(&attached.clock))
        };
        clock.seek(start, true)
    }

    /// Tear everything down and return to idle.
    pub fn close(&self) {
        self.reset(None, LoadState::Idle);
        debug!(session = %self.id(), "session closed");
    }
}

impl<S: TranscriptSource> Drop for ViewingSession<S> {
    fn drop(&mut self) {
        self.inner.get_mut().player.take();
    }
}
