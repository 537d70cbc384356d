//! Transcript service
//!
//! Runs locate → select → parse strictly in sequence. The first failure
//! short-circuits and is returned tagged with its stage; a default
//! transcript is never substituted.

use std::future::Future;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CaptionError, PipelineError, Stage};
use crate::locator::CaptionTrackLocator;
use crate::parser::CueParser;
use crate::selector::{select_track, LanguagePreference};
use crate::types::{Transcript, VideoId};
use crate::upstream::{UpstreamClient, UpstreamConfig};

/// Requested caption quality. Accepted but currently inert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

/// Requested extraction method. Accepted but currently inert: every method
/// runs the page-scrape path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Auto,
    Api,
    Ocr,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::High => "high",
        }
    }
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Auto => "auto",
            Method::Api => "api",
            Method::Ocr => "ocr",
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Quality::Standard),
            "high" => Ok(Quality::High),
            other => Err(format!("unknown quality: {}", other)),
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Method::Auto),
            "api" => Ok(Method::Api),
            "ocr" => Ok(Method::Ocr),
            other => Err(format!("unknown method: {}", other)),
        }
    }
}

/// A single extraction request
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRequest {
    pub video_id: VideoId,
    pub quality: Quality,
    pub method: Method,
    /// Reserved for a documented-API strategy. Never logged.
    pub api_key: Option<String>,
}

impl TranscriptRequest {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            quality: Quality::default(),
            method: Method::default(),
            api_key: None,
        }
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }
}

/// Anything that can turn a request into a transcript.
///
/// Implemented by the in-process [`TranscriptService`] and by the HTTP
/// client for the service boundary.
pub trait TranscriptSource: Send + Sync + 'static {
    fn fetch_transcript(
        &self,
        request: TranscriptRequest,
    ) -> impl Future<Output = Result<Transcript, PipelineError>> + Send;
}

/// The extraction pipeline behind one request/response contract
#[derive(Debug, Clone)]
pub struct TranscriptService {
    locator: CaptionTrackLocator,
    parser: CueParser,
    language: LanguagePreference,
}

impl TranscriptService {
    pub fn new(upstream: UpstreamConfig, language: LanguagePreference) -> crate::Result<Self> {
        let client = UpstreamClient::new(upstream)?;
        Ok(Self {
            locator: CaptionTrackLocator::new(client.clone()),
            parser: CueParser::new(client),
            language,
        })
    }

    pub fn language(&self) -> &LanguagePreference {
        &self.language
    }

    /// Extract the transcript for a video.
    pub async fn get_transcript(&self, request: &TranscriptRequest) -> Result<Transcript, PipelineError> {
        let video_id = &request.video_id;

        if request.quality != Quality::Standard || request.method != Method::Auto || request.api_key.is_some() {
            debug!(
                video_id = %video_id,
                quality = request.quality.as_str(),
                method = request.method.as_str(),
                api_key = request.api_key.is_some(),
                "extraction hints accepted; only the default path is implemented"
            );
        }

        let tracks = self
            .locator
            .locate(video_id)
            .await
            .map_err(|e| stage_failed(video_id, Stage::Locate, e))?;

        let track = select_track(&tracks, &self.language);
        debug!(
            video_id = %video_id,
            language = %track.language_code,
            name = %track.display_name,
            auto_generated = track.auto_generated,
            "caption track selected"
        );

        let transcript = self
            .parser
            .fetch(track)
            .await
            .map_err(|e| stage_failed(video_id, Stage::Parse, e))?;

        info!(video_id = %video_id, cues = transcript.len(), "transcript extracted");
        Ok(transcript)
    }
}

impl TranscriptSource for TranscriptService {
    async fn fetch_transcript(&self, request: TranscriptRequest) -> Result<Transcript, PipelineError> {
        self.get_transcript(&request).await
    }
}

fn stage_failed(video_id: &VideoId, stage: Stage, error: CaptionError) -> PipelineError {
    warn!(video_id = %video_id, stage = %stage, kind = error.kind(), error = %error, "extraction failed");
    PipelineError::new(stage, error)
}
