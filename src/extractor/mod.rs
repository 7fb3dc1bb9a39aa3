//! Odds extraction and probability inference.
//!
//! `OddsExtractor::analyze` is the whole pipeline:
//!
//! raw text → scanner → normalizer → synthesizer → `AnalysisResult`
//!
//! Participant extraction and bookmaker detection run on the same text
//! and are merged into the result. Everything here is pure: compiled
//! patterns are immutable statics and no state survives between calls,
//! so one extractor can be shared freely across threads and tasks.

pub mod bookmaker;
pub mod normalizer;
pub mod participants;
pub mod scanner;
pub mod synthesizer;

use rust_decimal::prelude::*;
use tracing::debug;

use crate::types::{AnalysisError, AnalysisResult, Locale};

/// Round half away from zero to two decimal places.
///
/// Rounds the exact binary value, so `1.025_f64` (stored as `1.02499…`)
/// becomes `1.02`.
pub(crate) fn round2(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Stateless odds analyzer. The locale only selects placeholder names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OddsExtractor {
    locale: Locale,
}

impl OddsExtractor {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// All plausible coefficients in `text`, in scan order.
    pub fn coefficients(&self, text: &str) -> Vec<f64> {
        let candidates = scanner::scan(text);
        let accepted = normalizer::normalize(&candidates);
        debug!(
            candidates = candidates.len(),
            accepted = accepted.len(),
            "Coefficients scanned"
        );
        accepted
    }

    /// Analyze one block of OCR text.
    ///
    /// Fails only when fewer than two plausible coefficients are present.
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let raw_coefficients = self.coefficients(text);
        let synthesis = synthesizer::synthesize(&raw_coefficients)?;

        let participants = participants::extract_participants(text, self.locale);
        let recommendation = participants.label(synthesis.favorite).to_string();
        let bookmaker = bookmaker::detect_bookmaker(text).to_string();

        Ok(AnalysisResult {
            participants,
            coefficients: synthesis.coefficients,
            probabilities: synthesis.probabilities,
            margin: synthesis.margin,
            favorite: synthesis.favorite,
            recommendation,
            bookmaker,
            raw_coefficients,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParticipantPair, Side};

    #[test]
    fn test_round2() {
        assert_eq!(round2(54.054054), 54.05);
        assert_eq!(round2(23.8095238), 23.81);
        assert_eq!(round2(2.125), 2.13);
        assert_eq!(round2(-2.125), -2.13);
        assert_eq!(round2(41.0 / 40.0), 1.02);
        assert!(round2(f64::NAN).is_nan());
    }

    #[test]
    fn test_analyze_full_result() {
        let extractor = OddsExtractor::new(Locale::Ru);
        let result = extractor
            .analyze("fonbet\nспартак vs зенит\nп1 1.85 п2 4.20")
            .unwrap();

        assert_eq!(result.participants, ParticipantPair::new("спартак", "зенит"));
        assert_eq!(result.coefficients, [1.85, 4.2]);
        assert_eq!(result.probabilities, [54.05, 23.81]);
        assert_eq!(result.margin, 22.14);
        assert_eq!(result.favorite, Side::First);
        assert_eq!(result.recommendation, "спартак");
        assert_eq!(result.bookmaker, "fonbet");
        assert_eq!(result.raw_coefficients, vec![1.85, 4.2, 1.85, 4.2]);
    }

    #[test]
    fn test_recommendation_follows_lower_coefficient() {
        let extractor = OddsExtractor::default();
        let result = extractor.analyze("цска - динамо 3.40 1.95").unwrap();
        assert_eq!(result.favorite, Side::Second);
        assert_eq!(result.recommendation, "динамо");
    }

    #[test]
    fn test_recommendation_uses_placeholder_label() {
        let extractor = OddsExtractor::new(Locale::En);
        let result = extractor.analyze("2.50 1.60").unwrap();
        assert_eq!(result.recommendation, "Team B");
        assert!(!result.participants.extracted);
    }

    #[test]
    fn test_insufficient_data() {
        let extractor = OddsExtractor::default();
        assert_eq!(
            extractor.analyze("спартак vs зенит 1.5").unwrap_err(),
            AnalysisError::InsufficientData { found: 1 }
        );
        assert_eq!(
            extractor.analyze("нет коэффициентов").unwrap_err(),
            AnalysisError::InsufficientData { found: 0 }
        );
    }

    #[test]
    fn test_stray_non_ascii_digit_keeps_real_odds() {
        let result = OddsExtractor::default()
            .analyze("спартак vs зенит\nп1 ٣1.85 п2 4.20")
            .unwrap();
        assert_eq!(result.coefficients, [1.85, 4.2]);
        assert_eq!(result.recommendation, "спартак");
    }

    #[test]
    fn test_single_two_place_value_counts_twice() {
        // The dot-decimal and two-place passes both emit "1.85".
        let result = OddsExtractor::default().analyze("1.85").unwrap();
        assert_eq!(result.coefficients, [1.85, 1.85]);
        assert_eq!(result.margin, -8.1);
    }

    #[test]
    fn test_coefficients_only() {
        let extractor = OddsExtractor::default();
        assert_eq!(extractor.coefficients("0.5 2,10 5/2"), vec![2.1, 2.5]);
    }

    #[test]
    fn test_extractor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OddsExtractor>();
    }
}
