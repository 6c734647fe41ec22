//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Caller passed an unusable `k` or distance threshold.
    #[error("config error: {0}")]
    Config(String),

    /// Errors from the underlying rag-store crate (embedding, vector store).
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Completion failures while generating the final answer.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),
}

impl ContextorError {
    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ContextorError::Config(_) => false,
            ContextorError::Rag(e) => e.is_transient(),
            ContextorError::Llm(e) => e.is_transient(),
        }
    }
}
