//! Human-readable rendering of analyses.
//!
//! Produces the chat-style report delivered to end users, plus the fixed
//! status messages (no odds, OCR failure, welcome) in each locale.

use std::fmt::Write;

use crate::types::{AnalysisResult, HistoryEntry, Locale, Side};

struct Labels {
    header: &'static str,
    coefficients: &'static str,
    probabilities: &'static str,
    margin: &'static str,
    bookmaker: &'static str,
    recommendation: &'static str,
    disclaimer: &'static str,
}

fn labels(locale: Locale) -> &'static Labels {
    const RU: Labels = Labels {
        header: "🏆 Анализ матча:",
        coefficients: "📊 Коэффициенты:",
        probabilities: "🎯 Вероятности победы:",
        margin: "📈 Маржа букмекера:",
        bookmaker: "🏦 Букмекер:",
        recommendation: "💡 Рекомендация:",
        disclaimer: "⚠️ Анализ носит информационный характер!",
    };
    const EN: Labels = Labels {
        header: "🏆 Match analysis:",
        coefficients: "📊 Odds:",
        probabilities: "🎯 Win probabilities:",
        margin: "📈 Bookmaker margin:",
        bookmaker: "🏦 Bookmaker:",
        recommendation: "💡 Recommendation:",
        disclaimer: "⚠️ For information only!",
    };
    match locale {
        Locale::Ru => &RU,
        Locale::En => &EN,
    }
}

/// Full multi-line report for one analysis.
pub fn render(result: &AnalysisResult, locale: Locale) -> String {
    let l = labels(locale);
    let p = &result.participants;
    let mut out = String::new();

    let _ = writeln!(out, "{}", l.header);
    let _ = writeln!(out, "{} vs {}", p.first, p.second);
    out.push('\n');

    let _ = writeln!(out, "{}", l.coefficients);
    for side in [Side::First, Side::Second] {
        let _ = writeln!(out, "{}: {:.2}", p.label(side), result.coefficient(side));
    }
    out.push('\n');

    let _ = writeln!(out, "{}", l.probabilities);
    for side in [Side::First, Side::Second] {
        let _ = writeln!(out, "{}: {:.2}%", p.label(side), result.probability(side));
    }
    out.push('\n');

    let _ = writeln!(out, "{} {:.2}%", l.margin, result.margin);
    if result.bookmaker_known() {
        let _ = writeln!(out, "{} {}", l.bookmaker, result.bookmaker);
    }
    out.push('\n');

    let _ = writeln!(out, "{} {}", l.recommendation, result.recommendation);
    out.push('\n');
    out.push_str(l.disclaimer);
    out
}

pub fn no_odds_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "❌ Не найдены коэффициенты на изображении",
        Locale::En => "❌ No odds found in the image",
    }
}

pub fn ocr_failed_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => "❌ Не удалось распознать текст на изображении",
        Locale::En => "❌ Could not recognize any text in the image",
    }
}

pub fn welcome_message(locale: Locale) -> &'static str {
    match locale {
        Locale::Ru => {
            "🏆 Сервис анализа спортивных ставок!\n\n\
             Отправьте скриншот с коэффициентами матча, и я проанализирую шансы команд."
        }
        Locale::En => {
            "🏆 Sports betting analysis service!\n\n\
             Send a screenshot with match odds and I will estimate each side's chances."
        }
    }
}

/// One line per stored analysis, newest first as given.
pub fn render_history(entries: &[HistoryEntry], locale: Locale) -> String {
    if entries.is_empty() {
        return match locale {
            Locale::Ru => "История пуста".to_string(),
            Locale::En => "No analyses yet".to_string(),
        };
    }

    entries
        .iter()
        .map(|e| {
            format!(
                "{} | {} | {:.2} / {:.2} | {:.2}% / {:.2}%",
                e.created_at.format("%Y-%m-%d %H:%M"),
                e.participants,
                e.coefficients[0],
                e.coefficients[1],
                e.probabilities[0],
                e.probabilities[1],
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
