use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::RagError;

/// Always fails; stands in when no embedding backend is configured.
#[derive(Clone)]
pub struct NoopEmbedder;

impl EmbeddingsProvider for NoopEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async { Err(RagError::MissingEmbedding) })
    }
}
