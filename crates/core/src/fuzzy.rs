//! Fallback replacement for text that does not contain a detection verbatim.
//!
//! Tries a normalized substring comparison first, then a whitespace-tolerant
//! regex, for each pair in order.

use crate::matcher::FlexiblePattern;
use crate::normalize::TextNormalizer;
use crate::types::{ReplacementPair, ReplacementSet};

/// Result of a fuzzy replacement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyOutcome {
    /// Text after every applied replacement.
    pub new_text: String,

    /// Pairs that matched, in the order they were attempted.
    pub applied: Vec<ReplacementPair>,
}

/// Applies replacement pairs using normalized and flexible matching.
#[derive(Debug, Clone, Default)]
pub struct FuzzyReplacer {
    normalizer: TextNormalizer,
}

impl FuzzyReplacer {
    /// Create a new fuzzy replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `pairs` to `text` in order.
    ///
    /// Each pair works on the text produced by the pairs before it. A pair
    /// whose normalized original is contained in the normalized text (and
    /// literally in the raw text) is replaced literally; otherwise its
    /// flexible pattern is substituted case-insensitively. A pair whose
    /// original is only whitespace is never matched flexibly, and a pair
    /// whose pattern cannot be built is logged and skipped. Zero matches is
    /// not an error.
    pub fn apply(&self, text: &str, pairs: &ReplacementSet) -> FuzzyOutcome {
        log::debug!("Attempting fuzzy matching for: '{}'", text);

        let mut new_text = text.to_string();
        let mut applied = Vec::new();

        for pair in pairs {
            if pair.original.is_empty() {
                continue;
            }

            let normalized_text = self.normalizer.normalize(&new_text);
            let normalized_original = self.normalizer.normalize(&pair.original);

            // A normalized hit only counts if the raw text holds the original
            // verbatim; otherwise the flexible pattern has to do the work.
            let literal_hit = new_text.contains(&pair.original);
            if literal_hit && normalized_text.contains(&normalized_original) {
                new_text = new_text.replace(&pair.original, &pair.replacement);
                log::info!(
                    "  Fuzzy match (normalized): '{}' -> '{}'",
                    pair.original,
                    pair.replacement
                );
                applied.push(pair.clone());
                continue;
            }

            // An empty pattern would match between every character.
            if normalized_original.is_empty() {
                continue;
            }

            let pattern = match FlexiblePattern::new(&normalized_original) {
                Ok(pattern) => pattern,
                Err(e) => {
                    log::warn!("Skipping fuzzy match for '{}': {}", pair.original, e);
                    continue;
                }
            };

            if pattern.is_match(&normalized_text) {
                new_text = pattern
                    .replace_all(&new_text, &pair.replacement)
                    .into_owned();
                log::info!(
                    "  Fuzzy match (flexible /{}/): '{}' -> '{}'",
                    pattern.as_str(),
                    pair.original,
                    pair.replacement
                );
                applied.push(pair.clone());
            }
        }

        FuzzyOutcome { new_text, applied }
    }
}

/// Apply `pairs` to `text` with the default fuzzy replacer.
pub fn apply_fuzzy(text: &str, pairs: &ReplacementSet) -> FuzzyOutcome {
    FuzzyReplacer::new().apply(text, pairs)
}
