//! Probability synthesis.
//!
//! Turns the first two decimal coefficients into naive implied
//! probabilities, the bookmaker margin and a pick.
//!
//! Probabilities are `100 / odds` and are not normalised to sum to 100.
//! The gap is reported as the margin: `100 - (p1 + p2)`.
//!
//! The pick is always the favorite, i.e. the side with the lower
//! coefficient. Equal coefficients pick the first side.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use tracing::debug;

use super::round2;
use crate::types::{AnalysisError, Side};

/// Implied probabilities and margin for a coefficient pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Synthesis {
    pub coefficients: [f64; 2],
    pub probabilities: [f64; 2],
    pub margin: f64,
    pub favorite: Side,
}

/// `round(100 / coefficient, 2)`, in percent.
pub fn implied_probability(coefficient: f64) -> f64 {
    round2(100.0 / coefficient)
}

/// `round(100 - (p1 + p2), 2)`.
///
/// The subtraction is done in decimal so `100 - 77.86` is exactly `22.14`.
pub fn margin(probabilities: [f64; 2]) -> f64 {
    let sum: Option<Decimal> = probabilities.iter().map(|p| Decimal::from_f64(*p)).sum();
    match sum {
        Some(sum) => (dec!(100) - sum)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or_else(|| round2(100.0 - probabilities.iter().sum::<f64>())),
        None => round2(100.0 - probabilities.iter().sum::<f64>()),
    }
}

/// The side with the lower coefficient.
pub fn favorite(coefficients: [f64; 2]) -> Side {
    if coefficients[0] > coefficients[1] {
        Side::Second
    } else {
        Side::First
    }
}

/// Synthesize from the first two entries of `coefficients`.
///
/// Fails with [`AnalysisError::InsufficientData`] when fewer than two are given.
pub fn synthesize(coefficients: &[f64]) -> Result<Synthesis, AnalysisError> {
    let [c1, c2] = match coefficients {
        [c1, c2, ..] => [*c1, *c2],
        _ => {
            return Err(AnalysisError::InsufficientData {
                found: coefficients.len(),
            })
        }
    };

    let probabilities = [implied_probability(c1), implied_probability(c2)];
    let synthesis = Synthesis {
        coefficients: [c1, c2],
        probabilities,
        margin: margin(probabilities),
        favorite: favorite([c1, c2]),
    };

    debug!(
        c1,
        c2,
        p1 = probabilities[0],
        p2 = probabilities[1],
        margin = synthesis.margin,
        favorite = %synthesis.favorite,
        "Probabilities synthesized"
    );

    Ok(synthesis)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
