//! Formatting-preserving replacement inside a single text frame.
//!
//! Replacement first works run by run, so each run keeps its own font. Only
//! when no run contains a detection on its own (typically because the text
//! is split across runs) is the whole frame rewritten as one run carrying
//! the style of the frame's first run.

use crate::fuzzy::FuzzyReplacer;
use crate::model::{Font, FontSize, RgbColor, TextFrame};
use crate::types::{ReplacementPair, ReplacementSet};

/// The style fields of a run that survive a text rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub size: Option<FontSize>,
    pub name: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<RgbColor>,
}

impl RunStyle {
    /// Capture the explicit style of `font`. Non-RGB colors are not captured.
    pub fn capture(font: &Font) -> Self {
        Self {
            size: font.size,
            name: font.name.clone(),
            bold: font.bold,
            italic: font.italic,
            color: font.color.rgb().ok(),
        }
    }

    /// Reapply every captured field onto `font`.
    ///
    /// Each field is restored on its own; a field that cannot be restored is
    /// logged and skipped without affecting the others.
    pub fn restore(&self, font: &mut Font) {
        if let Some(size) = self.size {
            if let Err(e) = font.set_size(size) {
                log::debug!("Could not restore font size: {}", e);
            }
        }
        if let Some(name) = &self.name {
            if let Err(e) = font.set_name(name) {
                log::debug!("Could not restore font name: {}", e);
            }
        }
        if let Some(bold) = self.bold {
            font.set_bold(bold);
        }
        if let Some(italic) = self.italic {
            font.set_italic(italic);
        }
        if let Some(color) = self.color {
            font.set_rgb(color);
        }
    }
}

/// Apply every pair in order as a literal replace-all.
///
/// Returns the new text and the pairs that occurred.
fn replace_literal(text: &str, pairs: &ReplacementSet) -> (String, Vec<ReplacementPair>) {
    let mut new_text = text.to_string();
    let mut applied = Vec::new();

    for pair in pairs {
        if pair.original.is_empty() || !new_text.contains(&pair.original) {
            continue;
        }
        new_text = new_text.replace(&pair.original, &pair.replacement);
        log::info!("  Replaced: '{}' -> '{}'", pair.original, pair.replacement);
        applied.push(pair.clone());
    }

    (new_text, applied)
}

/// Applies replacement pairs to text frames while keeping run formatting.
#[derive(Debug, Clone, Default)]
pub struct FormattingReplacer {
    fuzzy: FuzzyReplacer,
}

impl FormattingReplacer {
    /// Create a new replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `pairs` to `frame`, returning the number of replacements made.
    ///
    /// Run-level replacement counts one per changed run. The whole-frame
    /// fallback runs only if no run changed, and counts one per applied pair.
    pub fn apply_to_frame(&self, frame: &mut TextFrame, pairs: &ReplacementSet) -> usize {
        if pairs.is_empty() || frame.paragraphs.is_empty() {
            return 0;
        }

        let changed_runs = self.replace_runs(frame, pairs);
        if changed_runs > 0 {
            return changed_runs;
        }

        self.rewrite_frame(frame, pairs)
    }

    /// Replace inside each run independently.
    fn replace_runs(&self, frame: &mut TextFrame, pairs: &ReplacementSet) -> usize {
        let mut changed_runs = 0;

        for run in frame.runs_mut() {
            if run.text.is_empty() {
                continue;
            }

            let (new_text, _) = replace_literal(&run.text, pairs);
            if new_text == run.text {
                continue;
            }

            let style = RunStyle::capture(&run.font);
            run.text = new_text;
            style.restore(&mut run.font);
            changed_runs += 1;
        }

        changed_runs
    }

    /// Replace over the frame's full text and collapse it to a single run.
    fn rewrite_frame(&self, frame: &mut TextFrame, pairs: &ReplacementSet) -> usize {
        let full_text = frame.text();
        if full_text.is_empty() {
            return 0;
        }

        log::debug!("Processing text frame: '{}'", full_text);

        let (mut new_text, mut applied) = replace_literal(&full_text, pairs);
        if applied.is_empty() {
            let outcome = self.fuzzy.apply(&full_text, pairs);
            new_text = outcome.new_text;
            applied = outcome.applied;
        }

        if applied.is_empty() || new_text == full_text {
            return 0;
        }

        let style = frame.first_run().map(|run| RunStyle::capture(&run.font));
        let run = frame.set_single_run(new_text.as_str());
        if let Some(style) = style {
            style.restore(&mut run.font);
        }

        log::info!("  Updated text frame: {} replacements", applied.len());
        log::debug!("    Original: '{}'", full_text);
        log::debug!("    New: '{}'", new_text);

        applied.len()
    }
}
