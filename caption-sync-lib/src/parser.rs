//! Timed-text cue parser
//!
//! The timed-text resource is a small XML document:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8" ?>
//! <transcript>
//!   <text start="0.5" dur="2.1">Hello &amp;amp; welcome</text>
//!   ...
//! </transcript>
//! ```
//!
//! Character data arrives double-escaped, so it is decoded once at the XML
//! level and once more as HTML.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::error::{CaptionError, Result};
use crate::types::{CaptionTrack, Cue, Transcript};
use crate::upstream::UpstreamClient;

const ROOT_ELEMENT: &[u8] = b"transcript";
const CUE_ELEMENT: &[u8] = b"text";

/// Fetches and decodes a caption track's timed-text resource
#[derive(Debug, Clone)]
pub struct CueParser {
    client: UpstreamClient,
}

impl CueParser {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, track: &CaptionTrack) -> Result<Transcript> {
        debug!(language = %track.language_code, "fetching timed text");
        let document = self.client.fetch_text(&track.source_url).await?;
        let transcript = parse_timed_text(&document)?;
        debug!(cues = transcript.len(), "timed text parsed");
        Ok(transcript)
    }
}

/// Cue under construction, between `<text>` and `</text>`.
struct PendingCue {
    timing: Option<(f64, f64)>,
    text: String,
}

/// Parse a timed-text document into a transcript.
///
/// A `<transcript>` root with no cues is a valid, empty transcript. Cues
/// with unusable timing are dropped individually.
pub fn parse_timed_text(document: &str) -> Result<Transcript> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(false);

    let mut cues = Vec::new();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut pending: Option<PendingCue> = None;
    let mut dropped = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(CaptionError::MalformedCueDocument(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        };

        match event {
            Event::Start(e) => {
                depth += 1;
                if depth == 1 {
                    check_root(&e)?;
                    root_seen = true;
                } else if depth == 2 && e.name().as_ref() == CUE_ELEMENT {
                    pending = Some(PendingCue {
                        timing: cue_timing(&e)?,
                        text: String::new(),
                    });
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    check_root(&e)?;
                    root_seen = true;
                } else if depth == 1 && e.name().as_ref() == CUE_ELEMENT {
                    match cue_timing(&e)? {
                        Some((start, dur)) => cues.push(Cue::new(String::new(), start, dur)),
                        None => dropped += 1,
                    }
                }
            }
            Event::Text(t) => {
                if let Some(cue) = pending.as_mut() {
                    cue.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::CData(t) => {
                if let Some(cue) = pending.as_mut() {
                    cue.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(cue) = pending.take() {
                        match cue.timing {
                            Some((start, dur)) => {
                                cues.push(Cue::new(decode_text(&cue.text), start, dur))
                            }
                            None => dropped += 1,
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err(CaptionError::MalformedCueDocument(
            "document has no <transcript> root element".to_string(),
        ));
    }
    if depth != 0 {
        return Err(CaptionError::MalformedCueDocument(
            "document ended inside an open element".to_string(),
        ));
    }
    if dropped > 0 {
        debug!(dropped, kept = cues.len(), "dropped cues with unusable timing");
    }

    Ok(Transcript::new(cues))
}

fn check_root(e: &BytesStart) -> Result<()> {
    if e.name().as_ref() == ROOT_ELEMENT {
        Ok(())
    } else {
        Err(CaptionError::MalformedCueDocument(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(e.name().as_ref())
        )))
    }
}

/// Read `start`/`dur` from a cue element.
///
/// `Ok(None)` marks a cue to drop: missing or unparsable `start`, or an
/// unparsable `dur`. A missing `dur` counts as zero.
fn cue_timing(e: &BytesStart) -> Result<Option<(f64, f64)>> {
    let mut start = None;
    let mut dur = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| CaptionError::MalformedCueDocument(e.to_string()))?;
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"start" => start = Some(value),
            b"dur" => dur = Some(value),
            _ => {}
        }
    }

    let Some(start) = start.as_deref().and_then(parse_seconds) else {
        return Ok(None);
    };
    let dur = match dur.as_deref() {
        None => 0.0,
        Some(raw) => match parse_seconds(raw) {
            Some(d) => d,
            None => return Ok(None),
        },
    };
    Ok(Some((start, dur)))
}

fn parse_seconds(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// XML-level decode, then the HTML-level decode the platform's double
/// escaping calls for.
fn decode_text(raw: &str) -> String {
    let xml_level = html_escape::decode_html_entities(raw);
    html_escape::decode_html_entities(&xml_level).into_owned()
}
