//! Test fixtures for integration tests
//!
//! A mock video platform serving watch pages and timed-text documents.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use caption_sync_lib::UpstreamConfig;

use crate::config::ServerConfig;
use crate::state::AppState;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

/// Server state pointed at a mock platform
pub fn state_for(upstream: &MockServer) -> Arc<AppState> {
    let config = ServerConfig {
        static_dir: None,
        upstream: UpstreamConfig {
            base_url: upstream.uri(),
            timeout_secs: 5,
            ..UpstreamConfig::default()
        },
        ..ServerConfig::default()
    };
    Arc::new(AppState::new(config).expect("state"))
}

fn watch_page(tracks: &[serde_json::Value]) -> String {
    let player_response = serde_json::json!({
        "captions": {
            "playerCaptionsTracklistRenderer": {
                "captionTracks": tracks,
            }
        }
    });
    format!(
        "<html><body><script>var ytInitialPlayerResponse = {};</script></body></html>",
        player_response
    )
}

fn track(upstream: &MockServer, video_id: &str, lang: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "baseUrl": format!("{}/api/timedtext?v={}&lang={}", upstream.uri(), video_id, lang),
        "name": { "simpleText": name },
        "languageCode": lang,
    })
}

/// Mount a video with an English track holding `cues` as (start, dur, text).
pub async fn mount_video(
    upstream: &MockServer,
    video_id: &str,
    cues: &[(&str, &str, &str)],
    delay: Duration,
) {
    let page = watch_page(&[
        track(upstream, video_id, "fr", "French"),
        track(upstream, video_id, "en", "English"),
    ]);
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", video_id))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page)
                .set_delay(delay),
        )
        .mount(upstream)
        .await;

    let mut doc = String::from("<?xml version=\"1.0\" encoding=\"utf-8\" ?><transcript>");
    for (start, dur, text) in cues {
        doc.push_str(&format!(
            "<text start=\"{}\" dur=\"{}\">{}</text>",
            start, dur, text
        ));
    }
    doc.push_str("</transcript>");
    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .and(query_param("v", video_id))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_string(doc))
        .mount(upstream)
        .await;
}

/// Mount a watch page with no caption data at all.
pub async fn mount_uncaptioned(upstream: &MockServer, video_id: &str) {
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", video_id))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>No captions</body></html>"),
        )
        .mount(upstream)
        .await;
}

/// Log output captured from a thread-local subscriber
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a subscriber with the server's default filter at debug,
    /// writing into the returned capture until the guard is dropped.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(
                "caption_sync_server=debug,caption_sync_lib=debug,tower_http=debug",
            ))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
