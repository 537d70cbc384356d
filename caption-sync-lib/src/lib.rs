//! Caption extraction and playback-synchronised transcripts.
//!
//! The extraction side turns a video URL into a time-ordered [`Transcript`]:
//! resolve the identifier, locate the caption tracks on the watch page,
//! select one, then fetch and parse its timed-text document. The playback
//! side follows an embedded player's clock and keeps the active cue in view.

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

pub(crate) mod client;
pub(crate) mod error;
pub(crate) mod identifier;
pub(crate) mod locator;
pub(crate) mod parser;
pub mod player;
pub(crate) mod selector;
pub(crate) mod service;
pub(crate) mod types;
pub(crate) mod upstream;

#[cfg(test)]
pub(crate) mod tests;

pub use client::{ErrorBody, HttpTranscriptClient, TranscriptResponse};
pub use error::{CaptionError, PipelineError, PlayerError, Result, Stage};
pub use identifier::resolve_identifier;
pub use locator::{extract_caption_tracks, CaptionTrackLocator};
pub use parser::{parse_timed_text, CueParser};
pub use selector::{select_track, LanguagePreference};
pub use service::{Method, Quality, TranscriptRequest, TranscriptService, TranscriptSource};
pub use types::{CaptionTrack, Cue, PlaybackTime, Transcript, VideoId};
pub use upstream::{UpstreamClient, UpstreamConfig};
