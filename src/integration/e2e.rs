//! End-to-end tests through the router against a mock platform

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use caption_sync_lib::{resolve_identifier, TranscriptRequest};

use super::fixtures::{mount_uncaptioned, mount_video, state_for, LogCapture, VIDEO_ID};
use crate::http::create_router;
use crate::http::middleware::REQUEST_ID_HEADER;

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_transcript_from_url() {
    let upstream = MockServer::start().await;
    mount_video(
        &upstream,
        VIDEO_ID,
        &[("0.5", "2.1", "Hello &amp;amp; welcome"), ("2.6", "1.4", "to the show")],
        Duration::ZERO,
    )
    .await;
    let app = create_router(state_for(&upstream));

    let (status, body) = get_json(
        &app,
        "/api/transcript?videoId=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ%26t%3D42",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({
            "transcript": [
                { "text": "Hello & welcome", "start": 0.5, "duration": 2.1 },
                { "text": "to the show", "start": 2.6, "duration": 1.4 }
            ]
        })
    );
}

#[tokio::test]
async fn test_bare_id_with_hints() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[("0", "1", "hi")], Duration::ZERO).await;
    let app = create_router(state_for(&upstream));

    let (status, body) = get_json(
        &app,
        "/api/transcript?videoId=dQw4w9WgXcQ&quality=high&method=bogus&youtubeApiKey=k",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript"][0]["text"], "hi");
}

#[tokio::test]
async fn test_empty_transcript_is_ok() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[], Duration::ZERO).await;
    let app = create_router(state_for(&upstream));

    let (status, body) = get_json(&app, "/api/transcript?videoId=dQw4w9WgXcQ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "transcript": [] }));
}

#[tokio::test]
async fn test_missing_video_id() {
    let upstream = MockServer::start().await;
    let app = create_router(state_for(&upstream));

    for uri in ["/api/transcript", "/api/transcript?videoId=", "/api/transcript?videoId=%20"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body, serde_json::json!({ "error": "Video ID is required" }));
    }
}

#[tokio::test]
async fn test_invalid_identifier() {
    let upstream = MockServer::start().await;
    let app = create_router(state_for(&upstream));

    let (status, body) = get_json(&app, "/api/transcript?videoId=https%3A%2F%2Fexample.com%2F").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_identifier");
    assert_eq!(body["stage"], "resolve");
    assert!(body["userMessage"].as_str().unwrap().contains("YouTube"));
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_captions_error_payload() {
    let upstream = MockServer::start().await;
    mount_uncaptioned(&upstream, VIDEO_ID).await;
    let app = create_router(state_for(&upstream));

    let (status, body) = get_json(&app, "/api/transcript?videoId=dQw4w9WgXcQ").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch transcript");
    assert_eq!(body["kind"], "no_caption_tracks_found");
    assert_eq!(body["stage"], "locate");
    assert!(body["details"].as_str().unwrap().contains(VIDEO_ID));
    assert!(body.get("transcript").is_none());
}

#[tokio::test]
async fn test_upstream_failure_hides_body() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/watch"))
        .respond_with(ResponseTemplate::new(503).set_body_string("internal secret page"))
        .mount(&upstream)
        .await;
    let app = create_router(state_for(&upstream));

    let (status, body) = get_json(&app, "/api/transcript?videoId=dQw4w9WgXcQ").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "upstream_unavailable");
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("503"));
    assert!(!details.contains("secret"));
}

#[tokio::test]
async fn test_concurrent_requests_share_extraction() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[("0", "1", "shared")], Duration::from_millis(300)).await;
    let state = state_for(&upstream);
    let app = create_router(state.clone());

    let uri = "/api/transcript?videoId=dQw4w9WgXcQ";
    let (a, b, c) = tokio::join!(get_json(&app, uri), get_json(&app, uri), get_json(&app, uri));
    for (status, body) in [a, b, c] {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transcript"][0]["text"], "shared");
    }

    let page_fetches = upstream
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/watch")
        .count();
    assert_eq!(page_fetches, 1);
    assert_eq!(state.in_flight_count(), 0);

    let (_, _, metrics) = get(&app, "/metrics").await;
    let metrics = String::from_utf8(metrics).unwrap();
    assert!(metrics.contains("caption_sync_shared_extractions_total 2"));
}

#[tokio::test]
async fn test_sequential_requests_extract_again() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[("0", "1", "fresh")], Duration::ZERO).await;
    let app = create_router(state_for(&upstream));

    let uri = "/api/transcript?videoId=dQw4w9WgXcQ";
    get_json(&app, uri).await;
    get_json(&app, uri).await;

    let page_fetches = upstream
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/watch")
        .count();
    assert_eq!(page_fetches, 2);
}

fn transcript_request() -> TranscriptRequest {
    TranscriptRequest::new(resolve_identifier(VIDEO_ID).unwrap())
}

#[tokio::test]
async fn test_cancelled_request_leaves_no_in_flight_entry() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[("0", "1", "slow")], Duration::from_millis(500)).await;
    let state = state_for(&upstream);

    let task = {
        let state = state.clone();
        tokio::spawn(async move { state.get_transcript(transcript_request()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(state.in_flight_count(), 1);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert_eq!(state.in_flight_count(), 0);
}

#[tokio::test]
async fn test_cancelled_waiter_keeps_shared_extraction() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[("0", "1", "kept")], Duration::from_millis(300)).await;
    let state = state_for(&upstream);

    let spawn_request = || {
        let state = state.clone();
        tokio::spawn(async move { state.get_transcript(transcript_request()).await })
    };
    let first = spawn_request();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = spawn_request();
    tokio::time::sleep(Duration::from_millis(50)).await;

    second.abort();
    assert!(second.await.unwrap_err().is_cancelled());
    assert_eq!(state.in_flight_count(), 1);

    let transcript = first.await.unwrap().unwrap();
    assert_eq!(transcript[0].text, "kept");
    assert_eq!(state.in_flight_count(), 0);
}

#[tokio::test]
async fn test_api_key_stays_out_of_logs() {
    let upstream = MockServer::start().await;
    mount_video(&upstream, VIDEO_ID, &[("0", "1", "logged")], Duration::ZERO).await;
    let app = create_router(state_for(&upstream));
    let (logs, _guard) = LogCapture::install();

    let (status, _) = get_json(
        &app,
        "/api/transcript?videoId=dQw4w9WgXcQ&youtubeApiKey=SECRETKEY123",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let output = logs.contents();
    assert!(output.contains("path=/api/transcript"));
    assert!(output.contains("transcript extracted"));
    assert!(!output.contains("SECRETKEY123"));
    assert!(!output.contains("youtubeApiKey"));
}

#[tokio::test]
async fn test_service_endpoints() {
    let upstream = MockServer::start().await;
    mount_uncaptioned(&upstream, VIDEO_ID).await;
    let app = create_router(state_for(&upstream));

    let (status, headers, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    assert!(headers.contains_key(REQUEST_ID_HEADER));

    let (status, version) = get_json(&app, "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(version["status"], "online");
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
    assert!(version["started_at"].is_string());

    get_json(&app, "/api/transcript?videoId=dQw4w9WgXcQ").await;
    let (status, _, metrics) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let metrics = String::from_utf8(metrics).unwrap();
    assert!(metrics.contains("caption_sync_requests_by_endpoint{endpoint=\"/health\"} 1"));
    assert!(metrics.contains("caption_sync_errors_total{kind=\"no_caption_tracks_found\"} 1"));
}
