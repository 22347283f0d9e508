//! Error types for slide redaction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, redacting, or saving a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read, or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A matching pattern could not be compiled (e.g. it exceeds the regex size limit).
    #[error("Invalid match pattern for '{term}': {reason}")]
    PatternError { term: String, reason: String },

    /// A style value could not be read from or written to a run.
    #[error("Style error: {0}")]
    StyleError(String),

    /// Failed to parse the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// A text frame could not be written back into its slide part.
    #[error("Write-back error in '{part}': {reason}")]
    WriteBackError { part: String, reason: String },

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Detection input could not be decoded.
    #[error("Invalid detections: {0}")]
    DetectionError(String),

    /// A report could not be serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
