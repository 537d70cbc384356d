//! The library's HTTP client and viewing session against a live server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use wiremock::MockServer;

use caption_sync_lib::player::{
    LoadOutcome, LoadState, Player, PlayerCommand, PlayerEvent, ScrollRequest, SessionContext,
    SessionOptions, ViewSink, ViewingSession,
};
use caption_sync_lib::{
    CaptionError, HttpTranscriptClient, PlaybackTime, PlayerError, Stage, TranscriptRequest,
    TranscriptSource,
};

use super::fixtures::{mount_uncaptioned, mount_video, state_for, VIDEO_ID};
use crate::http::create_router;

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_server(upstream: &MockServer) -> String {
    let app = create_router(state_for(upstream));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Default)]
struct TestPlayer {
    time: Mutex<Option<PlaybackTime>>,
    commands: Mutex<Vec<PlayerCommand>>,
    destroyed: AtomicUsize,
}

impl Player for TestPlayer {
    fn current_time(&self) -> Option<PlaybackTime> {
        *self.time.lock()
    }

    fn send(&self, command: &PlayerCommand) -> Result<(), PlayerError> {
        self.commands.lock().push(command.clone());
        Ok(())
    }

    fn destroy(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct TestView {
    highlights: Mutex<Vec<Option<usize>>>,
    scrolls: Mutex<Vec<ScrollRequest>>,
}

impl TestView {
    async fn wait_for_highlight(&self, index: usize) {
        for _ in 0..400 {
            if self.highlights.lock().contains(&Some(index)) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cue {} never highlighted: {:?}", index, self.highlights.lock());
    }
}

impl ViewSink for TestView {
    fn highlight(&self, index: Option<usize>) {
        self.highlights.lock().push(index);
    }

    fn scroll_into_view(&self, request: ScrollRequest) {
        self.scrolls.lock().push(request);
    }
}

fn session_for(base_url: &str, view: Arc<TestView>) -> Arc<ViewingSession<HttpTranscriptClient>> {
    let client = HttpTranscriptClient::new(base_url, Duration::from_secs(5)).unwrap();
    let context = SessionContext::new(view).with_options(SessionOptions {
        poll_interval: Duration::from_millis(10),
        ..SessionOptions::default()
    });
    ViewingSession::new(context, Arc::new(client))
}

#[tokio::test]
async fn test_client_fetches_transcript() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[("1", "2", "one"), ("3", "2", "two")], Duration::ZERO).await;
    let base_url = spawn_server(&upstream).await;

    let client = HttpTranscriptClient::new(&base_url, Duration::from_secs(5)).unwrap();
    let request = TranscriptRequest::new(caption_sync_lib::resolve_identifier(VIDEO_ID).unwrap());
    let transcript = client.fetch_transcript(request).await.unwrap();
    assert_eq!(transcript.full_text(), "one two");
    assert_eq!(transcript[1].timestamp_label(), "0:03");
}

#[tokio::test]
async fn test_client_maps_service_error() {
    let upstream = MockServer::start().await;
    mount_uncaptioned(&upstream, VIDEO_ID).await;
    let base_url = spawn_server(&upstream).await;

    let client = HttpTranscriptClient::new(&base_url, Duration::from_secs(5)).unwrap();
    let request = TranscriptRequest::new(caption_sync_lib::resolve_identifier(VIDEO_ID).unwrap());
    let err = client.fetch_transcript(request).await.unwrap_err();
    assert_eq!(err.stage, Stage::Locate);
    assert!(matches!(err.error, CaptionError::NoCaptionTracksFound(_)));
}

#[tokio::test]
async fn test_session_follows_playback() {
    let upstream = MockServer::start().await;
    mount_video(
        &upstream,
        VIDEO_ID,
        &[("0", "2", "a"), ("2", "3", "b"), ("5", "1", "c")],
        Duration::ZERO,
    )
    .await;
    let base_url = spawn_server(&upstream).await;
    let view = Arc::new(TestView::default());
    let session = session_for(&base_url, view.clone());

    let outcome = session
        .load("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        .await;
    assert_eq!(outcome, LoadOutcome::Applied);
    assert_eq!(session.state().transcript().map(|t| t.len()), Some(3));

    let player = Arc::new(TestPlayer::default());
    *player.time.lock() = Some(2.5);
    session.attach_player(player.clone()).unwrap();
    session.handle_player_event(PlayerEvent::Ready);

    view.wait_for_highlight(1).await;
    assert_eq!(session.active_cue(), Some(1));
    assert!(view.scrolls.lock().contains(&ScrollRequest::centered(1)));

    session.select_cue(2).unwrap();
    assert_eq!(
        player.commands.lock().last(),
        Some(&PlayerCommand::seek_to(5.0, true))
    );

    *player.time.lock() = Some(5.0);
    view.wait_for_highlight(2).await;

    session.close();
    assert_eq!(player.destroyed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_session_shows_service_failure() {
    let upstream = MockServer::start().await;
    mount_uncaptioned(&upstream, VIDEO_ID).await;
    let base_url = spawn_server(&upstream).await;
    let session = session_for(&base_url, Arc::new(TestView::default()));

    session.load(VIDEO_ID).await;
    match session.state() {
        LoadState::Failed {
            message, retryable, ..
        } => {
            assert_eq!(
                message,
                CaptionError::NoCaptionTracksFound(String::new()).user_message()
            );
            assert!(!retryable);
        }
        other => panic!("unexpected state {:?}", other),
    }
    assert!(session.copy_text().is_none());
}
