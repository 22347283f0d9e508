//! Whitespace-tolerant matching of literal search terms.

use crate::{Error, Result};
use regex::{NoExpand, Regex, RegexBuilder};
use std::borrow::Cow;

/// Pattern fragment that stands in for each space of a search term.
const FLEXIBLE_WHITESPACE: &str = r"\s*";

/// A case-insensitive regex built from a literal term, tolerant of any
/// (or no) whitespace where the term has a single space.
#[derive(Debug, Clone)]
pub struct FlexiblePattern {
    regex: Regex,
}

impl FlexiblePattern {
    /// Build a flexible pattern for `term`.
    ///
    /// All regex metacharacters in the term are escaped first, so the term
    /// is always matched literally apart from its spaces.
    pub fn new(term: &str) -> Result<Self> {
        let pattern = build_pattern(term);
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::PatternError {
                term: term.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { regex })
    }

    /// Whether the pattern occurs anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replace every occurrence with `replacement`, taken literally.
    pub fn replace_all<'t>(&self, text: &'t str, replacement: &str) -> Cow<'t, str> {
        self.regex.replace_all(text, NoExpand(replacement))
    }

    /// The generated regex source.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Escape `term` and widen each space into a zero-or-more whitespace wildcard.
pub fn build_pattern(term: &str) -> String {
    regex::escape(term).replace(' ', FLEXIBLE_WHITESPACE)
}

/// Whether `term` flexibly matches somewhere in (already normalized) `text`.
pub fn is_flexible_match(text: &str, term: &str) -> Result<bool> {
    Ok(FlexiblePattern::new(term)?.is_match(text))
}
