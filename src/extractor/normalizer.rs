//! Coefficient normalizer.
//!
//! Converts scanned candidates to decimal odds and keeps only plausible
//! values. Dates, scores, percentages and OCR junk fall outside the
//! accepted range and are dropped without error.

use tracing::{debug, warn};

use super::round2;
use super::scanner::{CoefficientCandidate, Notation};

/// Accepted coefficients are strictly greater than this.
pub const MIN_COEFFICIENT: f64 = 1.0;
/// Accepted coefficients are strictly less than this.
pub const MAX_COEFFICIENT: f64 = 100.0;

/// Whether `value` is inside the open interval (1.0, 100.0).
pub fn is_plausible(value: f64) -> bool {
    value > MIN_COEFFICIENT && value < MAX_COEFFICIENT
}

/// Convert one candidate to a decimal value, without range filtering.
///
/// Returns `None` for zero denominators and for tokens that do not parse.
pub fn to_decimal(candidate: &CoefficientCandidate<'_>) -> Option<f64> {
    match candidate.notation {
        Notation::Fraction => fraction_to_decimal(candidate.text),
        Notation::Decimal | Notation::TwoPlaceDecimal => {
            match candidate.text.replace(',', ".").parse::<f64>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(candidate = candidate.text, error = %e, "Unparseable coefficient candidate");
                    None
                }
            }
        }
    }
}

/// `N/D` as `N / D` rounded to two places. No `+1` offset is applied.
fn fraction_to_decimal(token: &str) -> Option<f64> {
    let (numerator, denominator) = token.split_once('/')?;

    let parsed = numerator
        .parse::<u64>()
        .and_then(|n| denominator.parse::<u64>().map(|d| (n, d)));

    match parsed {
        Ok((_, 0)) => {
            debug!(candidate = token, "Zero denominator, dropping fraction");
            None
        }
        Ok((n, d)) => Some(round2(n as f64 / d as f64)),
        Err(e) => {
            warn!(candidate = token, error = %e, "Unparseable fraction candidate");
            None
        }
    }
}

/// Normalize every candidate and keep the plausible ones, in input order.
pub fn normalize(candidates: &[CoefficientCandidate<'_>]) -> Vec<f64> {
    candidates
        .iter()
        .filter_map(|c| to_decimal(c))
        .filter(|v| is_plausible(*v))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
