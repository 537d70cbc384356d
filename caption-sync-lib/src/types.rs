use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Canonical 11-character video identifier.
///
/// Only produced by [`crate::resolve_identifier`], so holding one means the
/// input has already been validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub const LEN: usize = 11;

    pub(crate) fn new_unchecked(id: String) -> Self {
        debug_assert_eq!(id.len(), Self::LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One caption stream offered by the platform for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub language_code: String,
    pub display_name: String,
    pub source_url: String,
    /// Speech-recognition track (`kind: "asr"`)
    #[serde(default)]
    pub auto_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vss_id: Option<String>,
}

/// One timed caption entry.
///
/// Occupies `[start_seconds, start_seconds + duration_seconds)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub text: String,
    #[serde(rename = "start", alias = "startSeconds")]
    pub start_seconds: f64,
    #[serde(rename = "duration", alias = "durationSeconds")]
    pub duration_seconds: f64,
    #[serde(
        rename = "alternativeText",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub alternative_text: Option<String>,
}

impl Cue {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
            alternative_text: None,
        }
    }

    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }

    /// `m:ss` label shown next to each line.
    pub fn timestamp_label(&self) -> String {
        let total = self.start_seconds.max(0.0).floor() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }
}

/// Time-ordered cues for one video.
///
/// Platform order is trusted to be non-decreasing by start time; nothing
/// here re-sorts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    cues: Vec<Cue>,
}

impl Transcript {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn into_cues(self) -> Vec<Cue> {
        self.cues
    }

    /// All cue texts joined by a single space.
    pub fn full_text(&self) -> String {
        self.cues
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Deref for Transcript {
    type Target = [Cue];

    fn deref(&self) -> &[Cue] {
        &self.cues
    }
}

impl From<Vec<Cue>> for Transcript {
    fn from(cues: Vec<Cue>) -> Self {
        Self::new(cues)
    }
}

/// Playback offset in seconds, as polled from the player
pub type PlaybackTime = f64;
