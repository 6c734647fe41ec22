//! Typed error for the evaluation engine.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvalError {
    /// Invalid K values, concurrency or timeout; returned before any retrieval.
    #[error("config error: {0}")]
    Config(String),

    /// A test query that cannot be scored (collected, never fatal).
    #[error("malformed test query '{question}': {reason}")]
    MalformedQuery { question: String, reason: String },

    /// The retrieval function failed for one query (recorded, never fatal).
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The retrieval function exceeded the per-query timeout.
    #[error("retrieval timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}
