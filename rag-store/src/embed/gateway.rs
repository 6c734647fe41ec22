//! Embedding provider backed by the shared LLM gateway.
//!
//! Uses the `embedding` profile of [`LlmServiceProfiles`], which batches
//! inputs natively for both Ollama (`/api/embed`) and OpenAI (`/v1/embeddings`).

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;

use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::RagError;

/// Gateway embedding provider (async).
#[derive(Clone)]
pub struct GatewayEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected embedding size; `None` accepts whatever the model returns.
    dim: Option<usize>,
}

impl GatewayEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }

    fn check(&self, v: &[f32]) -> Result<(), RagError> {
        match self.dim {
            Some(want) if v.len() != want => Err(RagError::VectorSizeMismatch {
                got: v.len(),
                want,
            }),
            _ => Ok(()),
        }
    }
}

impl EmbeddingsProvider for GatewayEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await?;
            self.check(&v)?;
            Ok(v)
        })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            let out = self.svc.embed_batch(texts).await?;
            for v in &out {
                self.check(v)?;
            }
            Ok(out)
        })
    }
}
