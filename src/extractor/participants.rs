//! Participant extraction.
//!
//! Locates the two competing sides in OCR text using separator
//! heuristics. Patterns are tried in a fixed priority order and the
//! first one that yields two non-empty names wins. When nothing matches,
//! the locale placeholders are returned.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::types::{Locale, ParticipantPair};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

// Name tokens are Latin or Cyrillic letters only. `(?i)` folds case for
// both alphabets, including `Ё`. A two-word name stays on one line.
static RE_VERSUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([a-zа-яё]+(?:[ \t]+[a-zа-яё]+)?)\s+(?:vs|против|against)\s+([a-zа-яё]+(?:[ \t]+[a-zа-яё]+)?)",
    )
    .unwrap()
});
static RE_DASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-zа-яё]+(?:[ \t]+[a-zа-яё]+)?)\s*[-—]\s*([a-zа-яё]+(?:[ \t]+[a-zа-яё]+)?)")
        .unwrap()
});
static RE_CONJUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-zа-яё]+)\s+(?:и|and)\s+([a-zа-яё]+)").unwrap()
});

/// Betting vocabulary that OCR tends to glue onto team names.
/// Compared against lower-cased tokens.
const VOCABULARY: &[&str] = &[
    "коэффициент", "коэффициенты", "коэф", "кф", "odds",
    "матч", "match", "ставка", "bet", "победа", "win",
    "ничья", "draw", "тотал", "total", "фора", "handicap",
    // outcome markers: П1 / Х / П2 lose their digits to the letter class
    "п", "х", "x",
];

/// Separator heuristics, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    /// `vs`, `против`, `against`
    Versus,
    /// `-` or `—`
    Dash,
    /// `и`, `and`
    Conjunction,
}

impl Separator {
    pub const PRIORITY: [Separator; 3] = [
        Separator::Versus,
        Separator::Dash,
        Separator::Conjunction,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            Separator::Versus => &RE_VERSUS,
            Separator::Dash => &RE_DASH,
            Separator::Conjunction => &RE_CONJUNCTION,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract both participants, falling back to the locale placeholders.
pub fn extract_participants(text: &str, locale: Locale) -> ParticipantPair {
    match find_participants(text) {
        Some((pair, separator)) => {
            debug!(?separator, participants = %pair, "Participants extracted");
            pair
        }
        None => {
            debug!(%locale, "No participant separator matched, using placeholders");
            ParticipantPair::placeholder(locale)
        }
    }
}

/// Try each separator in priority order. `None` when none yields a pair.
pub fn find_participants(text: &str) -> Option<(ParticipantPair, Separator)> {
    Separator::PRIORITY
        .iter()
        .find_map(|sep| match_separator(text, *sep).map(|pair| (pair, *sep)))
}

/// Apply one separator pattern to `text`.
pub fn match_separator(text: &str, separator: Separator) -> Option<ParticipantPair> {
    let caps = separator.pattern().captures(text)?;
    let first = strip_vocabulary(caps.get(1)?.as_str())?;
    let second = strip_vocabulary(caps.get(2)?.as_str())?;
    Some(ParticipantPair::new(&first, &second))
}

/// Remove betting vocabulary from both ends of a captured name.
/// `None` if nothing but vocabulary remains.
fn strip_vocabulary(name: &str) -> Option<String> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let is_name = |token: &&str| {
        let lower = token.to_lowercase();
        !VOCABULARY.contains(&lower.as_str())
    };

    let start = tokens.iter().position(is_name)?;
    let end = tokens.iter().rposition(is_name)?;
    Some(tokens[start..=end].join(" "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
