//! Text normalization for matching detections against slide text.
//!
//! Collapses whitespace and folds typographic variants (smart quotes,
//! dashes, non-breaking spaces) so that text copied out of a slide and
//! text reported by a classifier compare equal.

use regex::Regex;
use std::sync::LazyLock;

/// Any run of whitespace, including Unicode spaces and line breaks.
static WHITESPACE_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Typographic characters and their plain ASCII equivalents.
const TYPOGRAPHIC_FOLDS: &[(char, char)] = &[
    ('\u{00A0}', ' '),  // Non-breaking space
    ('\u{2013}', '-'),  // En dash
    ('\u{2014}', '-'),  // Em dash
    ('\u{201C}', '"'),  // Left double quotation mark
    ('\u{201D}', '"'),  // Right double quotation mark
    ('\u{2018}', '\''), // Left single quotation mark
    ('\u{2019}', '\''), // Right single quotation mark
];

/// Fold a single character to its plain equivalent, if it has one.
fn fold_char(c: char) -> char {
    TYPOGRAPHIC_FOLDS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

/// Text normalizer used before comparing detections with slide text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new text normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize text for matching.
    ///
    /// - Collapses every whitespace run to one space and trims both ends
    /// - Maps non-breaking spaces to spaces
    /// - Maps en/em dashes to `-`
    /// - Maps curly double and single quotes to `"` and `'`
    ///
    /// Idempotent: normalizing twice gives the same result as once.
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let folded: String = text.chars().map(fold_char).collect();
        WHITESPACE_RUN_REGEX
            .replace_all(&folded, " ")
            .trim()
            .to_string()
    }
}

/// Normalize text with the default normalizer.
pub fn normalize(text: &str) -> String {
    TextNormalizer::new().normalize(text)
}
