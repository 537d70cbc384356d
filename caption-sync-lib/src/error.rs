use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds of the extraction pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    /// The input did not contain a usable 11-character video identifier
    #[error("Invalid video identifier: {0}")]
    InvalidIdentifier(String),

    /// A fetch failed, timed out or returned a non-2xx status
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The watch page carries no caption tracks for this video
    #[error("No caption tracks found for video {0}")]
    NoCaptionTracksFound(String),

    /// The embedded caption track fragment is not valid JSON
    #[error("Malformed caption track payload: {0}")]
    MalformedTrackPayload(String),

    /// The timed-text document does not parse or has an unexpected shape
    #[error("Malformed cue document: {0}")]
    MalformedCueDocument(String),
}

impl CaptionError {
    /// Stable machine-readable name, used in error payloads and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptionError::InvalidIdentifier(_) => "invalid_identifier",
            CaptionError::UpstreamUnavailable(_) => "upstream_unavailable",
            CaptionError::NoCaptionTracksFound(_) => "no_caption_tracks_found",
            CaptionError::MalformedTrackPayload(_) => "malformed_track_payload",
            CaptionError::MalformedCueDocument(_) => "malformed_cue_document",
        }
    }

    /// Rebuild an error from its kind name and diagnostic detail.
    pub fn from_kind(kind: &str, detail: impl Into<String>) -> Option<Self> {
        let detail = detail.into();
        let err = match kind {
            "invalid_identifier" => CaptionError::InvalidIdentifier(detail),
            "upstream_unavailable" => CaptionError::UpstreamUnavailable(detail),
            "no_caption_tracks_found" => CaptionError::NoCaptionTracksFound(detail),
            "malformed_track_payload" => CaptionError::MalformedTrackPayload(detail),
            "malformed_cue_document" => CaptionError::MalformedCueDocument(detail),
            _ => return None,
        };
        Some(err)
    }

    /// Only transient upstream failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CaptionError::UpstreamUnavailable(_))
    }

    /// Text safe to show to a viewer. Never includes diagnostic detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptionError::InvalidIdentifier(_) => {
                "Invalid YouTube URL. Please provide a valid YouTube video URL."
            }
            CaptionError::UpstreamUnavailable(_) => {
                "YouTube could not be reached right now. Please try again in a moment."
            }
            CaptionError::NoCaptionTracksFound(_) => {
                "This video has no captions available. It may be private, unavailable, or have captions disabled."
            }
            CaptionError::MalformedTrackPayload(_) | CaptionError::MalformedCueDocument(_) => {
                "The transcript could not be read because YouTube changed its page format."
            }
        }
    }
}

/// Pipeline stage an error originated from. Track selection cannot fail,
/// so it has no stage of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Locate,
    Parse,
    /// The request to the transcript service itself
    Request,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Locate => "locate",
            Stage::Parse => "parse",
            Stage::Request => "request",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extraction failure tagged with the stage that produced it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub error: CaptionError,
}

impl PipelineError {
    pub fn new(stage: Stage, error: CaptionError) -> Self {
        Self { stage, error }
    }

    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }

    pub fn user_message(&self) -> &'static str {
        self.error.user_message()
    }

    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}

/// Errors on the playback control channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// The player has not reported ready, or has been torn down
    #[error("Player not ready")]
    NotReady,

    /// The command could not be delivered to the player
    #[error("Failed to deliver player command: {0}")]
    Delivery(String),

    /// The referenced cue does not exist in the current transcript
    #[error("Cue index {index} out of range (transcript has {len} cues)")]
    CueOutOfRange { index: usize, len: usize },

    /// No transcript is loaded in the session
    #[error("No transcript loaded")]
    NoTranscript,
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CaptionError>;
