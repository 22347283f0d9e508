//! Per-slide and per-deck replacement orchestration.

use crate::model::Slide;
use crate::replacer::FormattingReplacer;
use crate::types::{Detection, DetectionMap, ReplacementSet};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A loaded, mutable presentation that can be saved once after replacement.
pub trait SlideDeck {
    /// Slides in presentation order.
    fn slides_mut(&mut self) -> &mut [Slide];

    /// Persist every mutation made to the slides.
    fn save(&mut self) -> Result<()>;
}

/// Outcome of applying detections to a whole deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementSummary {
    pub success: bool,
    pub total_replacements: usize,
    /// Replacements per 1-based slide number, including slides with none.
    pub replacements_by_slide: BTreeMap<usize, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplacementSummary {
    /// A failed run: zero counts and the error message.
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            total_replacements: 0,
            replacements_by_slide: BTreeMap::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Applies classifier detections to slides.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    replacer: FormattingReplacer,
}

impl Redactor {
    /// Create a new redactor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one slide's detections to every text box, table cell, and chart
    /// label on it. Returns the number of replacements made.
    pub fn apply_to_slide(&self, slide: &mut Slide, detections: &[Detection]) -> usize {
        if detections.is_empty() {
            return 0;
        }

        let pairs = ReplacementSet::from_detections(detections);
        if pairs.is_empty() {
            return 0;
        }

        log::info!("Applying {} replacements:", pairs.len());
        for pair in &pairs {
            log::info!("  '{}' -> '{}'", pair.original, pair.replacement);
        }

        let mut total = 0;
        for shape in &mut slide.shapes {
            let mut shape_total = 0;
            for frame in shape.text_frames_mut() {
                shape_total += self.replacer.apply_to_frame(frame, &pairs);
            }
            if shape_total > 0 {
                log::debug!(
                    "Shape '{}' (id {}): {} replacements",
                    shape.name,
                    shape.id,
                    shape_total
                );
            }
            total += shape_total;
        }

        total
    }

    /// Apply detections to every slide, then save the deck once.
    ///
    /// Slides missing from `detections` are recorded with zero replacements.
    /// A save failure is returned as a failed summary rather than an error.
    pub fn apply_to_deck<D: SlideDeck>(
        &self,
        deck: &mut D,
        detections: &DetectionMap,
    ) -> ReplacementSummary {
        let mut summary = ReplacementSummary {
            success: true,
            ..ReplacementSummary::default()
        };

        for slide in deck.slides_mut() {
            let count = match detections.get(&slide.number) {
                Some(slide_detections) => {
                    let count = self.apply_to_slide(slide, slide_detections);
                    log::info!("Slide {}: {} replacements applied", slide.number, count);
                    count
                }
                None => {
                    log::info!("Slide {}: No detections to apply", slide.number);
                    0
                }
            };

            summary.total_replacements += count;
            summary.replacements_by_slide.insert(slide.number, count);
        }

        if let Err(e) = deck.save() {
            log::error!("Error applying replacements: {}", e);
            return ReplacementSummary::failure(e);
        }

        log::info!("Total replacements applied: {}", summary.total_replacements);
        summary
    }
}
