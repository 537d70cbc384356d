//! Caption track selection

use serde::{Deserialize, Serialize};

use crate::types::CaptionTrack;

/// Language codes with their English display names.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("de", "German"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("hi", "Hindi"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
];

/// Preferred caption language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePreference {
    pub code: String,
    /// Matched case-insensitively against track display names
    pub english_name: Option<String>,
}

impl LanguagePreference {
    /// Build a preference from a language code, looking up its English name.
    pub fn from_code(code: &str) -> Self {
        let english_name = LANGUAGE_NAMES
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, name)| name.to_string());
        Self {
            code: code.to_string(),
            english_name,
        }
    }

    fn matches(&self, track: &CaptionTrack) -> bool {
        track.language_code == self.code
            || self
                .english_name
                .as_deref()
                .is_some_and(|name| track.display_name.eq_ignore_ascii_case(name))
    }
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self::from_code("en")
    }
}

/// Pick the first track in platform order matching the preference, or
/// the first track if none does.
///
/// # Panics
///
/// `tracks` must be non-empty. The locator never yields an empty set, so
/// an empty slice here is a caller bug.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], preference: &LanguagePreference) -> &'a CaptionTrack {
    assert!(!tracks.is_empty(), "select_track called with no tracks");

    tracks
        .iter()
        .find(|t| preference.matches(t))
        .unwrap_or(&tracks[0])
}
