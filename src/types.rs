//! Shared types for ODDSIGHT.
//!
//! The data model produced by the extractor and consumed by the report
//! renderer, the store and the HTTP service. Everything here is plain
//! owned data so results can be cloned, serialized and sent across tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// Language used for placeholder names and rendered reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    /// Fixed participant labels used when no separator pattern matches.
    pub fn placeholders(&self) -> (&'static str, &'static str) {
        match self {
            Locale::Ru => ("Команда A", "Команда B"),
            Locale::En => ("Team A", "Team B"),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Ru => write!(f, "ru"),
            Locale::En => write!(f, "en"),
        }
    }
}

/// Case-insensitive parse ("ru", "rus", "russian", "en", "eng", "english").
impl std::str::FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" | "rus" | "russian" => Ok(Locale::Ru),
            "en" | "eng" | "english" => Ok(Locale::En),
            _ => Err(anyhow::anyhow!("Unknown locale: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// One of the two competing sides, in the order they appear in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
}

impl Side {
    /// Zero-based index into the coefficient/probability pairs.
    pub fn index(&self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::First => write!(f, "FIRST"),
            Side::Second => write!(f, "SECOND"),
        }
    }
}

/// The two competing sides named in the text.
///
/// `extracted` is false when the names are the locale placeholders. That
/// is a normal outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantPair {
    pub first: String,
    pub second: String,
    pub extracted: bool,
}

impl ParticipantPair {
    /// A pair taken from the text. Both names are trimmed.
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            first: first.trim().to_string(),
            second: second.trim().to_string(),
            extracted: true,
        }
    }

    pub fn placeholder(locale: Locale) -> Self {
        let (first, second) = locale.placeholders();
        Self {
            first: first.to_string(),
            second: second.to_string(),
            extracted: false,
        }
    }

    pub fn label(&self, side: Side) -> &str {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }

    pub fn as_array(&self) -> [&str; 2] {
        [&self.first, &self.second]
    }
}

impl fmt::Display for ParticipantPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.first, self.second)
    }
}

// ---------------------------------------------------------------------------
// Analysis result
// ---------------------------------------------------------------------------

/// Bookmaker identifier reported when no alias matches.
pub const UNKNOWN_BOOKMAKER: &str = "unknown";

/// Outcome of a single `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub participants: ParticipantPair,
    /// First two accepted decimal coefficients, in text order.
    pub coefficients: [f64; 2],
    /// Naive implied probabilities in percent, 2-decimal rounded.
    pub probabilities: [f64; 2],
    /// 100 minus the sum of the implied probabilities, 2-decimal rounded.
    pub margin: f64,
    /// Side with the lower coefficient.
    pub favorite: Side,
    /// Label of the favorite.
    pub recommendation: String,
    pub bookmaker: String,
    /// Every accepted coefficient, duplicates included.
    pub raw_coefficients: Vec<f64>,
}

impl AnalysisResult {
    pub fn bookmaker_known(&self) -> bool {
        self.bookmaker != UNKNOWN_BOOKMAKER
    }

    pub fn coefficient(&self, side: Side) -> f64 {
        self.coefficients[side.index()]
    }

    pub fn probability(&self, side: Side) -> f64 {
        self.probabilities[side.index()]
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | odds {:.2}/{:.2} | prob {:.2}%/{:.2}% | margin {:.2}% | pick {} | [{}]",
            self.participants,
            self.coefficients[0],
            self.coefficients[1],
            self.probabilities[0],
            self.probabilities[1],
            self.margin,
            self.recommendation,
            self.bookmaker,
        )
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// A previously stored analysis, as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub participants: ParticipantPair,
    pub coefficients: [f64; 2],
    pub probabilities: [f64; 2],
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Caller-visible analysis failures.
///
/// Malformed and out-of-range candidates are absorbed by the extractor,
/// so the only variant is the "nothing to analyze" condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Insufficient data: found {found} valid coefficient(s), need 2")]
    InsufficientData { found: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            participants: ParticipantPair::new("спартак", "зенит"),
            coefficients: [1.85, 4.2],
            probabilities: [54.05, 23.81],
            margin: 22.14,
            favorite: Side::First,
            recommendation: "спартак".to_string(),
            bookmaker: "fonbet".to_string(),
            raw_coefficients: vec![1.85, 4.2, 1.85, 4.2],
        }
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!("ru".parse::<Locale>().unwrap(), Locale::Ru);
        assert_eq!("English".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn test_locale_default_is_russian() {
        assert_eq!(Locale::default(), Locale::Ru);
    }

    #[test]
    fn test_placeholders_per_locale() {
        let ru = ParticipantPair::placeholder(Locale::Ru);
        assert_eq!(ru.first, "Команда A");
        assert_eq!(ru.second, "Команда B");
        assert!(!ru.extracted);

        let en = ParticipantPair::placeholder(Locale::En);
        assert_eq!(en.as_array(), ["Team A", "Team B"]);
    }

    #[test]
    fn test_participant_pair_trims() {
        let pair = ParticipantPair::new("  real madrid ", "\tbarcelona\n");
        assert_eq!(pair.first, "real madrid");
        assert_eq!(pair.second, "barcelona");
        assert!(pair.extracted);
        assert_eq!(pair.to_string(), "real madrid vs barcelona");
    }

    #[test]
    fn test_side_helpers() {
        assert_eq!(Side::First.index(), 0);
        assert_eq!(Side::Second.index(), 1);
        let pair = ParticipantPair::new("a", "b");
        assert_eq!(pair.label(Side::Second), "b");
    }

    #[test]
    fn test_result_accessors() {
        let r = sample_result();
        assert_eq!(r.coefficient(Side::Second), 4.2);
        assert_eq!(r.probability(Side::First), 54.05);
        assert!(r.bookmaker_known());
    }

    #[test]
    fn test_result_display() {
        let s = sample_result().to_string();
        assert!(s.contains("спартак vs зенит"));
        assert!(s.contains("margin 22.14%"));
        assert!(s.contains("[fonbet]"));
    }

    #[test]
    fn test_result_serializes_side_lowercase() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert_eq!(json["favorite"], "first");
        assert_eq!(json["raw_coefficients"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = AnalysisError::InsufficientData { found: 1 };
        assert!(err.to_string().contains("found 1"));
    }
}
