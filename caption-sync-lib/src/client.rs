//! Transcript service wire format and HTTP client
//!
//! `GET /api/transcript?videoId=...` answers either
//! `{"transcript":[{"text","start","duration"}, ...]}` or an [`ErrorBody`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CaptionError, PipelineError, Stage};
use crate::service::{TranscriptRequest, TranscriptSource};
use crate::types::{Cue, Transcript};

/// Successful response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub transcript: Vec<Cue>,
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            user_message: None,
            kind: None,
            stage: None,
        }
    }

    /// Body for a failed extraction
    pub fn from_pipeline(error: impl Into<String>, err: &PipelineError) -> Self {
        Self {
            error: error.into(),
            details: Some(err.to_string()),
            user_message: Some(err.user_message().to_string()),
            kind: Some(err.kind().to_string()),
            stage: Some(err.stage),
        }
    }

    /// Rebuild the pipeline error this body describes. Bodies without a
    /// recognised kind count as an unavailable upstream.
    pub fn into_pipeline_error(self) -> PipelineError {
        let detail = self.details.unwrap_or(self.error);
        let stage = self.stage.unwrap_or(Stage::Request);
        let error = match self.kind.as_deref() {
            Some(kind) => CaptionError::from_kind(kind, detail.clone())
                .unwrap_or(CaptionError::UpstreamUnavailable(detail)),
            None => CaptionError::UpstreamUnavailable(detail),
        };
        PipelineError::new(stage, error)
    }
}

/// Client for a remote transcript service
#[derive(Debug, Clone)]
pub struct HttpTranscriptClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTranscriptClient {
    pub fn new(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CaptionError::UpstreamUnavailable(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_transcript(&self, request: &TranscriptRequest) -> Result<Transcript, PipelineError> {
        let url = format!("{}/api/transcript", self.base_url);
        let mut query = vec![
            ("videoId", request.video_id.as_str().to_string()),
            ("quality", request.quality.as_str().to_string()),
            ("method", request.method.as_str().to_string()),
        ];
        if let Some(key) = &request.api_key {
            query.push(("youtubeApiKey", key.clone()));
        }

        debug!(video_id = %request.video_id, "requesting transcript from service");
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if status.is_success() {
            let body: TranscriptResponse = response.json().await.map_err(|e| {
                PipelineError::new(
                    Stage::Request,
                    CaptionError::MalformedTrackPayload(format!(
                        "unexpected response body: {}",
                        e.without_url()
                    )),
                )
            })?;
            return Ok(Transcript::new(body.transcript));
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => Err(body.into_pipeline_error()),
            Err(_) => Err(PipelineError::new(
                Stage::Request,
                CaptionError::UpstreamUnavailable(format!("service returned HTTP {}", status.as_u16())),
            )),
        }
    }
}

impl TranscriptSource for HttpTranscriptClient {
    async fn fetch_transcript(&self, request: TranscriptRequest) -> Result<Transcript, PipelineError> {
        self.get_transcript(&request).await
    }
}

/// The request URL carries the API key, so it is stripped from the error.
fn request_failed(err: reqwest::Error) -> PipelineError {
    let detail = if err.is_timeout() {
        "transcript service timed out".to_string()
    } else {
        format!("transcript service unreachable: {}", err.without_url())
    };
    PipelineError::new(Stage::Request, CaptionError::UpstreamUnavailable(detail))
}
