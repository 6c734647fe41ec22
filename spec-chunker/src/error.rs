//! Error types for parsing and chunk building.

use serde::Serialize;
use thiserror::Error;

/// Top-level error for spec-chunker operations.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The document as a whole cannot be chunked (not an object, bad identifier).
    #[error("invalid document '{source_spec}': {reason}")]
    InvalidDocument { source_spec: String, reason: String },

    /// One logical unit could not be turned into a chunk.
    #[error("malformed unit '{unit}': {reason}")]
    MalformedUnit { unit: String, reason: String },

    /// Invalid chunker configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Reading a document from disk failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A unit that was skipped during parsing, with the reason.
///
/// Rejections never abort the document; they are reported alongside the chunks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedUnit {
    /// Location of the unit inside the document, e.g. `paths./candidates.post`.
    pub unit: String,
    pub reason: String,
}

impl RejectedUnit {
    pub fn new(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

impl From<RejectedUnit> for ChunkError {
    fn from(r: RejectedUnit) -> Self {
        ChunkError::MalformedUnit {
            unit: r.unit,
            reason: r.reason,
        }
    }
}
