//! HTTP request handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use caption_sync_lib::{
    resolve_identifier, CaptionError, ErrorBody, Method, PipelineError, Quality, Stage,
    TranscriptRequest, TranscriptResponse,
};

use crate::state::AppState;

pub const MISSING_VIDEO_ID: &str = "Video ID is required";
pub const FETCH_FAILED: &str = "Failed to fetch transcript";

/// Transcript API error
#[derive(Debug)]
pub enum ApiError {
    MissingVideoId,
    InvalidIdentifier(CaptionError),
    Pipeline(PipelineError),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingVideoId => "missing_video_id",
            ApiError::InvalidIdentifier(e) => e.kind(),
            ApiError::Pipeline(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingVideoId => (StatusCode::BAD_REQUEST, ErrorBody::new(MISSING_VIDEO_ID)),
            ApiError::InvalidIdentifier(err) => {
                let body = ErrorBody {
                    details: Some(err.to_string()),
                    user_message: Some(err.user_message().to_string()),
                    kind: Some(err.kind().to_string()),
                    stage: Some(Stage::Resolve),
                    ..ErrorBody::new(err.user_message())
                };
                (StatusCode::BAD_REQUEST, body)
            }
            ApiError::Pipeline(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::from_pipeline(FETCH_FAILED, &err),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

/// Query parameters of `GET /api/transcript`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptQuery {
    pub video_id: Option<String>,
    pub quality: Option<String>,
    pub method: Option<String>,
    pub youtube_api_key: Option<String>,
}

impl TranscriptQuery {
    fn quality(&self) -> Quality {
        parse_hint(self.quality.as_deref())
    }

    fn method(&self) -> Method {
        parse_hint(self.method.as_deref())
    }
}

/// Unknown hint values fall back to the default.
fn parse_hint<T>(raw: Option<&str>) -> T
where
    T: std::str::FromStr<Err = String> + Default,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => T::default(),
        Some(raw) => raw.parse().unwrap_or_else(|e: String| {
            debug!(error = %e, "ignoring unknown hint");
            T::default()
        }),
    }
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Version information endpoint
pub async fn version_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// Transcript endpoint
/// GET /api/transcript?videoId=...&quality=...&method=...&youtubeApiKey=...
pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TranscriptQuery>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let result = transcript_for(&state, &query).await;
    match &result {
        Ok(response) => state.metrics.record_transcript(response.transcript.len()),
        Err(err) => state.metrics.record_error(err.kind()),
    }
    result.map(Json)
}

async fn transcript_for(
    state: &AppState,
    query: &TranscriptQuery,
) -> Result<TranscriptResponse, ApiError> {
    let raw = query
        .video_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingVideoId)?;

    let video_id = resolve_identifier(raw).map_err(ApiError::InvalidIdentifier)?;
    let request = TranscriptRequest::new(video_id)
        .with_quality(query.quality())
        .with_method(query.method())
        .with_api_key(query.youtube_api_key.clone());

    let transcript = state.get_transcript(request.clone()).await?;
    info!(
        video_id = %request.video_id,
        cues = transcript.len(),
        "transcript served"
    );

    Ok(TranscriptResponse {
        transcript: transcript.cues().to_vec(),
    })
}
