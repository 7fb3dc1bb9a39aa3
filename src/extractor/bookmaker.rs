//! Bookmaker detection by alias lookup.

use crate::types::UNKNOWN_BOOKMAKER;

/// A bookmaker and the spellings OCR produces for its brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookmaker {
    /// Identifier reported in results.
    pub id: &'static str,
    /// Lower-case aliases, transliterations included.
    pub aliases: &'static [&'static str],
}

/// Known bookmakers in priority order. When several alias sets match,
/// the earliest entry wins.
pub const BOOKMAKERS: &[Bookmaker] = &[
    Bookmaker { id: "1xbet", aliases: &["1xbet", "1xstavka", "1хбет"] },
    Bookmaker { id: "fonbet", aliases: &["fonbet", "фонбет"] },
    Bookmaker { id: "marathon", aliases: &["marathon", "марафон"] },
    Bookmaker { id: "bet365", aliases: &["bet365", "бет365"] },
    Bookmaker { id: "leon", aliases: &["leon", "леон"] },
    Bookmaker { id: "winline", aliases: &["winline", "винлайн"] },
];

/// Identify the bookmaker by case-insensitive substring match.
/// Returns [`UNKNOWN_BOOKMAKER`] when no alias occurs in `text`.
pub fn detect_bookmaker(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    BOOKMAKERS
        .iter()
        .find(|b| b.aliases.iter().any(|alias| lower.contains(alias)))
        .map(|b| b.id)
        .unwrap_or(UNKNOWN_BOOKMAKER)
}
