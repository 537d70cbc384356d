//! Caption track locator
//!
//! Scrapes the watch page for the embedded `captionTracks` array. The page
//! is HTML with inline script, not JSON, so the array is cut out lexically
//! and wrapped in a minimal envelope before being handed to serde.
//!
//! This is the only component that knows the page format. Anything that
//! goes wrong here is terminal for the request.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CaptionError, Result};
use crate::types::{CaptionTrack, VideoId};
use crate::upstream::UpstreamClient;

#[derive(Deserialize)]
struct TrackEnvelope {
    #[serde(rename = "captionTracks")]
    caption_tracks: Vec<RawTrack>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    base_url: String,
    #[serde(default)]
    language_code: String,
    name: Option<RawName>,
    kind: Option<String>,
    vss_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawName {
    Simple {
        #[serde(rename = "simpleText")]
        simple_text: String,
    },
    Runs {
        runs: Vec<RawRun>,
    },
}

#[derive(Deserialize)]
struct RawRun {
    text: String,
}

impl RawName {
    fn into_text(self) -> String {
        match self {
            RawName::Simple { simple_text } => simple_text,
            RawName::Runs { runs } => runs.into_iter().map(|r| r.text).collect(),
        }
    }
}

impl From<RawTrack> for CaptionTrack {
    fn from(raw: RawTrack) -> Self {
        CaptionTrack {
            display_name: raw.name.map(RawName::into_text).unwrap_or_default(),
            language_code: raw.language_code,
            source_url: raw.base_url,
            auto_generated: raw.kind.as_deref() == Some("asr"),
            vss_id: raw.vss_id,
        }
    }
}

/// Fetches a watch page and extracts its caption tracks
#[derive(Debug, Clone)]
pub struct CaptionTrackLocator {
    client: UpstreamClient,
}

impl CaptionTrackLocator {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Locate the caption tracks for a video. Never returns an empty set.
    pub async fn locate(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
        let url = self.client.config().watch_url(video_id);
        debug!(video_id = %video_id, "fetching watch page");

        let page = self.client.fetch_text(&url).await?;
        let tracks = extract_caption_tracks(&page, video_id)?;

        debug!(video_id = %video_id, count = tracks.len(), "caption tracks located");
        Ok(tracks)
    }
}

/// Extract caption tracks from raw watch-page text.
pub fn extract_caption_tracks(page: &str, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
    let key = regex!(r#""captionTracks"\s*:\s*\["#)
        .find(page)
        .ok_or_else(|| CaptionError::NoCaptionTracksFound(video_id.to_string()))?;

    // The match ends just past the opening bracket.
    let open = key.end() - 1;
    let close = find_array_end(page, open).ok_or_else(|| {
        warn!(video_id = %video_id, "captionTracks array is unterminated");
        CaptionError::MalformedTrackPayload("captionTracks array is unterminated".to_string())
    })?;

    let fragment = &page[open..=close];
    let envelope: TrackEnvelope = serde_json::from_str(&format!(r#"{{"captionTracks":{}}}"#, fragment))
        .map_err(|e| {
            warn!(video_id = %video_id, error = %e, "captionTracks fragment is not valid JSON");
            CaptionError::MalformedTrackPayload(e.to_string())
        })?;

    if envelope.caption_tracks.is_empty() {
        return Err(CaptionError::NoCaptionTracksFound(video_id.to_string()));
    }

    Ok(envelope
        .caption_tracks
        .into_iter()
        .map(CaptionTrack::from)
        .collect())
}

/// Byte index of the `]` closing the array that opens at `open`.
///
/// Brackets inside JSON strings are ignored, so nested arrays and quoted
/// punctuation do not cut the fragment short.
fn find_array_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[open..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (b == b']').then_some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}
