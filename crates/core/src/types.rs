//! Domain types for detections, replacement pairs, and extracted slide data.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Detections keyed by 1-based slide number.
///
/// A slide missing from the map has zero detections.
pub type DetectionMap = BTreeMap<usize, Vec<Detection>>;

/// How sensitive a detected span is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Severity {
    High,
    #[default]
    Medium,
    Low,
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Self::High,
            "MEDIUM" => Self::Medium,
            "LOW" => Self::Low,
            other => {
                log::warn!("Unknown severity '{}', using MEDIUM", other);
                Self::Medium
            }
        }
    }
}

/// One span of sensitive text found on a slide by the external classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// The sensitive text as it appears on the slide.
    #[serde(alias = "text")]
    pub original: String,

    /// Text to put in its place.
    #[serde(default)]
    pub replacement: String,

    /// Category label (e.g. "PERSON", "PHONE").
    #[serde(default = "default_category")]
    pub category: String,

    /// Why the classifier flagged it.
    #[serde(default)]
    pub reason: String,

    #[serde(default, rename = "sensitivity_level", alias = "severity")]
    pub severity: Severity,
}

fn default_category() -> String {
    "unknown".to_string()
}

impl Detection {
    /// Create a detection with the default category, empty reason and MEDIUM severity.
    pub fn new(original: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            replacement: replacement.into(),
            category: default_category(),
            reason: String::new(),
            severity: Severity::default(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Parse a detection map from JSON of the form `{"<slide>": [detection, ...]}`.
pub fn parse_detection_map(json: &str) -> Result<DetectionMap> {
    serde_json::from_str(json).map_err(|e| Error::DetectionError(e.to_string()))
}

/// An (original, replacement) pair derived from a detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementPair {
    pub original: String,
    pub replacement: String,
}

impl ReplacementPair {
    /// Create a new pair.
    pub fn new(original: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            replacement: replacement.into(),
        }
    }

    /// Build a pair from a detection, or `None` if the detection has no original text.
    pub fn from_detection(detection: &Detection) -> Option<Self> {
        if detection.original.is_empty() {
            return None;
        }
        Some(Self::new(&detection.original, &detection.replacement))
    }
}

/// Replacement pairs for one slide, longest original first.
///
/// Ties keep their input order, so a longer original is always applied before
/// any shorter one that could be its substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementSet {
    pairs: Vec<ReplacementPair>,
}

impl ReplacementSet {
    /// Build an ordered set from arbitrary pairs, dropping empty originals.
    pub fn from_pairs(pairs: impl IntoIterator<Item = ReplacementPair>) -> Self {
        let mut pairs: Vec<ReplacementPair> =
            pairs.into_iter().filter(|p| !p.original.is_empty()).collect();
        // sort_by_key is stable
        pairs.sort_by_key(|p| Reverse(p.original.chars().count()));
        Self { pairs }
    }

    /// Build an ordered set from a slide's detections.
    pub fn from_detections(detections: &[Detection]) -> Self {
        Self::from_pairs(detections.iter().filter_map(ReplacementPair::from_detection))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReplacementPair> {
        self.pairs.iter()
    }

    pub fn as_slice(&self) -> &[ReplacementPair] {
        &self.pairs
    }
}

impl<'a> IntoIterator for &'a ReplacementSet {
    type Item = &'a ReplacementPair;
    type IntoIter = std::slice::Iter<'a, ReplacementPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Text and element counts extracted from one slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideData {
    /// 1-based slide number.
    pub slide_number: usize,

    /// Title placeholder text, if the slide has one.
    pub title: String,

    /// Non-empty text of every text box and table cell, in shape order.
    pub text_content: Vec<String>,

    pub images_count: usize,
    pub charts_count: usize,
    pub tables_count: usize,
}

impl SlideData {
    /// Create empty slide data for the given slide number.
    pub fn new(slide_number: usize) -> Self {
        Self {
            slide_number,
            ..Self::default()
        }
    }
}
