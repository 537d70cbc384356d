//! Video identifier resolution
//!
//! Accepts a pasted watch URL in any of the common shapes, or a bare
//! identifier, and extracts the canonical 11-character id. No I/O.

use crate::error::{CaptionError, Result};
use crate::types::VideoId;

/// Resolve user input into a [`VideoId`].
///
/// Recognised shapes: `watch?v=`, `&v=`, `youtu.be/`, `embed/`, `v/` and
/// `u/<c>/`. When several markers appear, the last one wins.
pub fn resolve_identifier(input: &str) -> Result<VideoId> {
    let input = input.trim();

    if regex!(r"^[A-Za-z0-9_-]{11}$").is_match(input) {
        return Ok(VideoId::new_unchecked(input.to_string()));
    }

    let caps = regex!(r"^.*(?:youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*$")
        .captures(input)
        .ok_or_else(|| CaptionError::InvalidIdentifier(format!("unrecognised input: {}", input)))?;
    let segment = &caps[1];

    if segment.len() != VideoId::LEN {
        return Err(CaptionError::InvalidIdentifier(format!(
            "identifier segment has length {}, expected {}",
            segment.len(),
            VideoId::LEN
        )));
    }
    if !regex!(r"^[A-Za-z0-9_-]+$").is_match(segment) {
        return Err(CaptionError::InvalidIdentifier(format!(
            "identifier segment contains invalid characters: {}",
            segment
        )));
    }

    Ok(VideoId::new_unchecked(segment.to_string()))
}
