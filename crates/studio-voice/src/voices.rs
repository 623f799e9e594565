//! Presenter voice catalog and speech text shaping.

use serde::{Deserialize, Serialize};

/// A curated ElevenLabs voice suited to the presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenterVoice {
    /// Lookup key (lowercase).
    pub key: &'static str,
    pub voice_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub language: &'static str,
    pub accent: &'static str,
    pub tone: &'static str,
}

pub const DEFAULT_VOICE: &str = "noah";

pub const VOICES: &[PresenterVoice] = &[
    PresenterVoice {
        key: "noah",
        voice_id: "n2svSAHTQ6OWjZIVJ4WL",
        name: "Noah",
        description: "Warm, friendly Kenyan male voice for welcoming and patient guidance",
        language: "en-KE",
        accent: "Kenyan",
        tone: "warm, patient, conversational",
    },
    PresenterVoice {
        key: "aria",
        voice_id: "XB0fDUnXU5powFXDhCwa",
        name: "Aria",
        description: "Warm, professional female voice with a natural Kenyan accent",
        language: "en-KE",
        accent: "Kenyan",
        tone: "warm, professional, accessible",
    },
    PresenterVoice {
        key: "sage",
        voice_id: "5ND885W2NyJmB6mcKrFt",
        name: "Sage",
        description: "Mature, warm voice for patient guidance and support",
        language: "en-KE",
        accent: "Kenyan",
        tone: "warm, patient, supportive",
    },
    PresenterVoice {
        key: "rachel",
        voice_id: "21m00Tcm4TlvDq8ikWAM",
        name: "Rachel",
        description: "Clear, warm voice suitable for government service guidance",
        language: "en",
        accent: "Neutral",
        tone: "warm, clear, helpful",
    },
];

/// Looks up a catalog voice by name, case-insensitively.
pub fn find_voice(name: &str) -> Option<&'static PresenterVoice> {
    let wanted = name.trim();
    VOICES.iter().find(|v| v.key.eq_ignore_ascii_case(wanted))
}

pub fn default_voice() -> &'static PresenterVoice {
    &VOICES[0]
}

/// What the spoken text is for; selects emphasis words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    GovernmentGuidance,
    #[default]
    Conversational,
    Accessibility,
}

impl ContentType {
    /// Parses a content type, falling back to conversational.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim() {
            "government_guidance" => Self::GovernmentGuidance,
            "accessibility" => Self::Accessibility,
            _ => Self::Conversational,
        }
    }

    pub fn emphasis_words(self) -> &'static [&'static str] {
        match self {
            Self::GovernmentGuidance => &["KRA", "PIN", "iTax", "nil returns", "step"],
            Self::Conversational => &["Rafiki", "help", "excellent", "confirmed"],
            Self::Accessibility => &["important", "next", "confirm", "click"],
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Wraps whole-word, case-insensitive occurrences of `word` in `**`.
fn emphasize(text: &str, word: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let haystack = text.to_ascii_lowercase();
    let needle = word.to_ascii_lowercase();
    if needle.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let start = from + pos;
        let end = start + needle.len();
        let bounded_left = !text[..start].chars().next_back().is_some_and(is_word_char);
        let bounded_right = !text[end..].chars().next().is_some_and(is_word_char);
        if bounded_left && bounded_right {
            out.push_str(&text[copied..start]);
            out.push_str("**");
            out.push_str(word);
            out.push_str("**");
            copied = end;
        }
        from = end;
    }
    out.push_str(&text[copied..]);
    out
}

/// Breaks the line after each sentence terminator that is followed by
/// whitespace, so the voice pauses between sentences.
fn add_sentence_pauses(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if matches!(c, '.' | '?' | '!') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            out.push('\n');
        }
    }
    out
}

/// Shapes text for natural delivery: emphasis markers and sentence pauses.
pub fn shape_text(text: &str, content_type: ContentType) -> String {
    let emphasized = content_type
        .emphasis_words()
        .iter()
        .fold(text.to_string(), |acc, word| emphasize(&acc, word));
    add_sentence_pauses(&emphasized).trim().to_string()
}
