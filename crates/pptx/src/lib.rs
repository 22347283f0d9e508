//! PPTX (Office Open XML) backend for slide redaction.
//!
//! Opens .pptx packages, binds the text of shapes, table cells, and chart
//! labels to the core slide model, and writes edits back without disturbing
//! markup the model does not cover.

pub mod binding;
pub mod document;
pub mod package;
pub mod parser;
pub mod xml;

#[cfg(test)]
mod fixture;

pub use document::{apply_to_file, PptxDocument};
pub use package::{PptxPackage, Relationship};
pub use parser::{FrameLocator, PptxParser};
