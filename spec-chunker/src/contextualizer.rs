//! Generates a short situating preamble per chunk through a completion provider.
//!
//! Failures are never fatal: one retry, then an empty prefix.

use std::sync::Arc;

use ai_llm_service::CompletionProvider;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

const MAX_ATTEMPTS: usize = 2;

/// Builds the contextualization prompt for one chunk.
pub fn contextual_prompt(document_summary: &str, chunk: &str) -> String {
    format!(
        "<document>\n{document_summary}\n</document>\n\
         Here is the chunk we want to situate within the whole document\n\
         <chunk>\n{chunk}\n</chunk>\n\
         Please give a short succinct context to situate this chunk within the overall document \
         for the purposes of improving search retrieval of the chunk. \
         Answer only with the succinct context and nothing else."
    )
}

/// Outcome of contextualizing one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Situated {
    /// A non-empty prefix was produced.
    Prefix(String),
    /// Every attempt failed; the chunk keeps an empty prefix.
    Fallback,
    /// Contextualization is disabled.
    Skipped,
}

impl Situated {
    pub fn into_prefix(self) -> String {
        match self {
            Situated::Prefix(p) => p,
            Situated::Fallback | Situated::Skipped => String::new(),
        }
    }
}

/// Bounded-concurrency contextualizer.
#[derive(Clone)]
pub struct Contextualizer {
    completer: Option<Arc<dyn CompletionProvider>>,
    concurrency: usize,
}

impl Contextualizer {
    pub fn new(completer: Arc<dyn CompletionProvider>, concurrency: usize) -> Self {
        Self {
            completer: Some(completer),
            concurrency: concurrency.max(1),
        }
    }

    /// A contextualizer that leaves every prefix empty.
    pub fn disabled() -> Self {
        Self {
            completer: None,
            concurrency: 1,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.completer.is_some()
    }

    /// Situates one chunk, retrying once. Empty responses count as failures.
    pub async fn situate(&self, document_summary: &str, chunk: &str) -> Situated {
        let Some(completer) = &self.completer else {
            return Situated::Skipped;
        };
        let prompt = contextual_prompt(document_summary, chunk);

        for attempt in 1..=MAX_ATTEMPTS {
            match completer.complete(&prompt, None).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Situated::Prefix(text.trim().to_string());
                }
                Ok(_) => warn!(attempt, "contextualization returned empty text"),
                Err(e) => warn!(attempt, error = %e, "contextualization failed"),
            }
        }
        debug!("contextualization fell back to empty prefix");
        Situated::Fallback
    }

    /// Situates many chunks with at most `concurrency` calls in flight.
    /// Output order matches input order.
    pub async fn situate_all(&self, document_summary: &str, chunks: &[String]) -> Vec<Situated> {
        if !self.is_enabled() {
            return vec![Situated::Skipped; chunks.len()];
        }
        stream::iter(chunks)
            .map(|c| self.situate(document_summary, c))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
