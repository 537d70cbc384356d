//! Playback clock adapter
//!
//! Polls the player's current time on a fixed cadence and publishes it on a
//! watch channel. Polling starts when the player reports ready, pauses
//! while playback is paused or ended, and resumes on play. The polling task
//! lives inside a [`TaskGuard`], so stopping is just dropping the guard.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::control::{Player, PlayerCommand, PlayerEvent, PlayerState};
use crate::error::PlayerError;
use crate::types::PlaybackTime;

/// Default poll cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A spawned task that is cancelled and aborted when the guard drops.
#[derive(Debug)]
pub struct TaskGuard {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TaskGuard {
    /// Spawn onto the current tokio runtime.
    pub fn spawn<F, Fut>(task: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(task(cancel.clone()));
        Self { cancel, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

struct ClockState {
    ready: bool,
    poll: Option<TaskGuard>,
}

/// Wraps one player instance for the lifetime of one video.
pub struct PlaybackClock {
    player: Arc<dyn Player>,
    interval: Duration,
    state: Mutex<ClockState>,
    ticks: Arc<watch::Sender<PlaybackTime>>,
    torn_down: AtomicBool,
}

impl PlaybackClock {
    pub fn new(player: Arc<dyn Player>, interval: Duration) -> Self {
        let (ticks, _) = watch::channel(0.0);
        Self {
            player,
            interval,
            state: Mutex::new(ClockState {
                ready: false,
                poll: None,
            }),
            ticks: Arc::new(ticks),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Receiver for polled playback times.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackTime> {
        self.ticks.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    pub fn is_polling(&self) -> bool {
        self.state.lock().poll.is_some()
    }

    /// Feed a player notification into the adapter.
    pub fn handle_event(&self, event: PlayerEvent) {
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }
        match event {
            PlayerEvent::Ready => {
                self.state.lock().ready = true;
                self.start_polling();
            }
            PlayerEvent::StateChange(PlayerState::Playing) => self.start_polling(),
            PlayerEvent::StateChange(PlayerState::Paused | PlayerState::Ended) => {
                self.stop_polling()
            }
            PlayerEvent::StateChange(_) => {}
            PlayerEvent::Error(code) => {
                warn!(code, "player reported an error");
                self.stop_polling();
            }
        }
    }

    /// Reposition playback, optionally resuming play.
    pub fn seek(&self, seconds: PlaybackTime, resume: bool) -> Result<(), PlayerError> {
        if self.torn_down.load(Ordering::SeqCst) || !self.is_ready() {
            return Err(PlayerError::NotReady);
        }
        debug!(seconds, resume, "seeking");
        self.player.send(&PlayerCommand::seek_to(seconds, resume))
    }

    fn start_polling(&self) {
        let mut state = self.state.lock();
        if !state.ready || state.poll.is_some() {
            return;
        }

        let player = Arc::clone(&self.player);
        let ticks = Arc::clone(&self.ticks);
        let every = self.interval;
        state.poll = Some(TaskGuard::spawn(move |cancel| async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Some(t) = player.current_time() {
                            ticks.send_replace(t);
                        }
                    }
                }
            }
        }));
        debug!(interval_ms = every.as_millis() as u64, "playback polling started");
    }

    fn stop_polling(&self) {
        if self.state.lock().poll.take().is_some() {
            debug!("playback polling stopped");
        }
    }

    /// Stop polling and release the player. Safe to call more than once.
    pub fn teardown(&self) {
        self.stop_polling();
        if !self.torn_down.swap(true, Ordering::SeqCst) {
            self.state.lock().ready = false;
            self.player.destroy();
            debug!("player torn down");
        }
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        self.teardown();
    }
}
