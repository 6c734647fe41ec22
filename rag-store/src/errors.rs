//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Missing embedding and no provider able to produce one.
    #[error("missing embedding and no provider supplied")]
    MissingEmbedding,

    /// Embedding gateway failures (transport, timeout, bad payload).
    #[error("embedding error: {0}")]
    Embedding(#[from] ai_llm_service::AiLlmError),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// A remote spec document could not be fetched.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// A whole document could not be read or chunked.
    #[error(transparent)]
    Chunk(#[from] spec_chunker::ChunkError),
}

impl RagError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RagError::Embedding(e) => e.is_transient(),
            RagError::Qdrant(_) | RagError::Fetch(_) => true,
            _ => false,
        }
    }
}
