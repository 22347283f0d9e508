//! JSON audit report of a sanitization run.

use crate::types::{Detection, DetectionMap};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default report location for a sanitized deck: the same path with a `.json` extension.
pub fn report_path_for(output: &Path) -> PathBuf {
    output.with_extension("json")
}

/// What was found and replaced in one presentation.
///
/// Serializes to the report format consumed by auditors: slide-number keys
/// become strings and detections carry `sensitivity_level`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizationReport {
    pub original_file: String,
    pub sanitized_file: String,
    pub total_slides: usize,
    pub total_detections: usize,
    pub total_replacements: usize,
    pub categories_summary: BTreeMap<String, usize>,
    pub detections_by_slide: BTreeMap<usize, Vec<Detection>>,
}

impl SanitizationReport {
    /// Build a report for a deck of `total_slides` slides.
    ///
    /// Every slide gets an entry in `detections_by_slide`, empty when the
    /// classifier reported nothing for it.
    pub fn new(
        original_file: impl Into<String>,
        sanitized_file: impl Into<String>,
        total_slides: usize,
        detections: &DetectionMap,
        total_replacements: usize,
    ) -> Self {
        let mut categories_summary = BTreeMap::new();
        let mut detections_by_slide = BTreeMap::new();
        let mut total_detections = 0;

        for slide_number in 1..=total_slides {
            let slide_detections = detections.get(&slide_number).cloned().unwrap_or_default();
            total_detections += slide_detections.len();
            for detection in &slide_detections {
                *categories_summary.entry(detection.category.clone()).or_insert(0) += 1;
            }
            detections_by_slide.insert(slide_number, slide_detections);
        }

        for slide_number in detections.keys().filter(|n| **n == 0 || **n > total_slides) {
            log::warn!(
                "Ignoring detections for slide {} (deck has {} slides)",
                slide_number,
                total_slides
            );
        }

        Self {
            original_file: original_file.into(),
            sanitized_file: sanitized_file.into(),
            total_slides,
            total_detections,
            total_replacements,
            categories_summary,
            detections_by_slide,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Human-readable summary, one line per entry.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "=== SANITIZATION SUMMARY ===".to_string(),
            format!("Original file: {}", self.original_file),
            format!("Sanitized file: {}", self.sanitized_file),
            format!("Total slides: {}", self.total_slides),
            format!("Total detections: {}", self.total_detections),
            format!("Total replacements: {}", self.total_replacements),
            String::new(),
            "Detections by category:".to_string(),
        ];

        for (category, count) in &self.categories_summary {
            lines.push(format!("  {}: {}", category, count));
        }

        lines.push(String::new());
        lines.push("Detections by slide:".to_string());
        for (slide_number, detections) in &self.detections_by_slide {
            if !detections.is_empty() {
                lines.push(format!(
                    "  Slide {}: {} detections",
                    slide_number,
                    detections.len()
                ));
            }
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn sample_detections() -> DetectionMap {
        let mut map = DetectionMap::new();
        map.insert(
            1,
            vec![
                Detection::new("Jane Roe", "PERSON").with_category("PII"),
                Detection::new("555-1234", "PHONE")
                    .with_category("PII")
                    .with_severity(Severity::High),
            ],
        );
        map.insert(3, vec![Detection::new("Project Falcon", "PROJECT").with_category("CONFIDENTIAL")]);
        map
    }

    #[test]
    fn test_report_totals() {
        let report = SanitizationReport::new("deck.pptx", "deck_sanitized.pptx", 3, &sample_detections(), 4);

        assert_eq!(report.total_slides, 3);
        assert_eq!(report.total_detections, 3);
        assert_eq!(report.total_replacements, 4);
        assert_eq!(report.categories_summary["PII"], 2);
        assert_eq!(report.categories_summary["CONFIDENTIAL"], 1);
        assert_eq!(report.detections_by_slide.len(), 3);
        assert!(report.detections_by_slide[&2].is_empty());
    }

    #[test]
    fn test_out_of_range_slides_ignored() {
        let mut detections = sample_detections();
        detections.insert(9, vec![Detection::new("ghost", "X")]);

        let report = SanitizationReport::new("a.pptx", "b.pptx", 3, &detections, 0);

        assert_eq!(report.total_detections, 3);
        assert!(!report.detections_by_slide.contains_key(&9));
    }

    #[test]
    fn test_json_shape() {
        let report = SanitizationReport::new("deck.pptx", "deck_sanitized.pptx", 3, &sample_detections(), 3);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["original_file"], "deck.pptx");
        assert_eq!(value["total_detections"], 3);
        let first = &value["detections_by_slide"]["1"][1];
        assert_eq!(first["original"], "555-1234");
        assert_eq!(first["replacement"], "PHONE");
        assert_eq!(first["category"], "PII");
        assert_eq!(first["reason"], "");
        assert_eq!(first["sensitivity_level"], "HIGH");
        assert_eq!(value["detections_by_slide"]["2"], serde_json::json!([]));
    }

    #[test]
    fn test_report_path_for() {
        assert_eq!(
            report_path_for(Path::new("out/deck_sanitized.pptx")),
            PathBuf::from("out/deck_sanitized.json")
        );
    }

    #[test]
    fn test_summary_lines() {
        let report = SanitizationReport::new("deck.pptx", "out.pptx", 3, &sample_detections(), 3);
        let lines = report.summary_lines();

        assert!(lines.contains(&"Total detections: 3".to_string()));
        assert!(lines.contains(&"  PII: 2".to_string()));
        assert!(lines.contains(&"  Slide 3: 1 detections".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("  Slide 2")));
    }
}
