//! Public API types re-used by the CLI and the evaluation engine.

use rag_store::StoreHit;
use serde::{Deserialize, Serialize};

/// Speaker of one conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered outcome of one query: hits in ascending distance, all within the threshold.
///
/// An empty result is the normal "no relevant information" outcome.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<StoreHit>,
    /// Set when the question was rewritten before embedding.
    pub rewritten_query: Option<String>,
}

impl RetrievalResult {
    /// Chunk ids, most relevant first.
    pub fn ranked_ids(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.id.clone()).collect()
    }

    /// Distances aligned with [`RetrievalResult::ranked_ids`].
    pub fn scores(&self) -> Vec<f32> {
        self.hits.iter().map(|h| h.distance).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Chunk texts in rank order.
    pub fn contexts(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.content.clone()).collect()
    }
}

/// Final answer together with the context passed to the model.
#[derive(Clone, Debug, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    /// Chunk texts fed to the model, in rank order.
    pub contexts: Vec<String>,
    /// Prior history plus this question and answer.
    pub history: Vec<ChatMessage>,
    pub retrieval: RetrievalResult,
}
