use crate::errors::RagError;
use std::{future::Future, pin::Pin};

pub mod gateway;
pub mod hashing;
pub mod noop_embedder;

/// Boxed future returned by embedding providers.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Async because real providers (Ollama, OpenAI) perform HTTP requests.
/// Implement this trait to plug in another backend.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds one text.
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>>;

    /// Embeds many texts; output order follows input order.
    ///
    /// The default issues one `embed` call per text, which is behaviorally
    /// equivalent to a native batch call.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        })
    }
}
