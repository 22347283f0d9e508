//! Core domain types, text matching, and formatting-preserving replacement
//! for redacting sensitive text from slide decks.

pub mod error;
pub mod fuzzy;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod replacer;
pub mod report;
pub mod types;

pub use error::{Error, Result};
pub use fuzzy::{FuzzyOutcome, FuzzyReplacer};
pub use matcher::FlexiblePattern;
pub use model::{
    Chart, ColorFormat, Font, FontSize, Paragraph, RgbColor, Shape, ShapeKind, Slide, Table,
    TextFrame, TextRun,
};
pub use normalize::TextNormalizer;
pub use orchestrator::{Redactor, ReplacementSummary, SlideDeck};
pub use replacer::{FormattingReplacer, RunStyle};
pub use report::{report_path_for, SanitizationReport};
pub use types::{
    parse_detection_map, Detection, DetectionMap, ReplacementPair, ReplacementSet, Severity,
    SlideData,
};
