//! Coefficient scanner.
//!
//! Finds candidate odds tokens in raw OCR text. Three notations are
//! scanned independently over the whole text and the matches are
//! concatenated in pass order, then match order. The dot decimal pass
//! and the two-place pass overlap on purpose, so a value like `1.85`
//! yields two candidates.

use regex::Regex;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

// ASCII digits only: a stray digit from another script must not join a token.
static RE_DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+[.,][0-9]+").unwrap());
static RE_FRACTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+/[0-9]+").unwrap());
static RE_TWO_PLACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+\.[0-9]{2}").unwrap());

/// Odds notation a candidate was matched under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notation {
    /// `1.85`, `2,10`
    Decimal,
    /// `5/2`
    Fraction,
    /// `1.85` again, exactly two digits after the dot.
    TwoPlaceDecimal,
}

impl Notation {
    /// Scan passes, in the order their matches are emitted.
    pub const ALL: [Notation; 3] = [
        Notation::Decimal,
        Notation::Fraction,
        Notation::TwoPlaceDecimal,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            Notation::Decimal => &RE_DECIMAL,
            Notation::Fraction => &RE_FRACTION,
            Notation::TwoPlaceDecimal => &RE_TWO_PLACE,
        }
    }
}

/// A raw token that looks like odds. Borrowed from the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefficientCandidate<'a> {
    pub text: &'a str,
    pub notation: Notation,
    /// Byte offset of the match in the scanned text.
    pub offset: usize,
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Run every notation pass over `text`.
pub fn scan(text: &str) -> Vec<CoefficientCandidate<'_>> {
    Notation::ALL
        .iter()
        .flat_map(|notation| scan_notation(text, *notation))
        .collect()
}

/// Run a single notation pass over `text`.
pub fn scan_notation(text: &str, notation: Notation) -> Vec<CoefficientCandidate<'_>> {
    notation
        .pattern()
        .find_iter(text)
        .map(|m| CoefficientCandidate {
            text: m.as_str(),
            notation,
            offset: m.start(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
