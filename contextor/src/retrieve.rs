//! Query Processor: rewrite → embed → nearest-neighbor query → threshold filter.
//!
//! The path is read-only against the vector store and holds no mutable state,
//! so one processor can serve many concurrent queries.

use std::collections::HashSet;
use std::sync::Arc;

use ai_llm_service::CompletionProvider;
use rag_store::{EmbeddingsProvider, RagStore, StoreHit, VectorStore};
use tracing::{debug, info, warn};

use crate::api_types::{ChatMessage, RetrievalResult};
use crate::cfg::validate_query_params;
use crate::error::ContextorError;
use crate::prompt::rewrite_prompt;

#[derive(Clone)]
pub struct QueryProcessor {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingsProvider>,
    /// Used only when there is conversation history to resolve.
    rewriter: Option<Arc<dyn CompletionProvider>>,
}

impl QueryProcessor {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingsProvider>) -> Self {
        Self {
            store,
            embedder,
            rewriter: None,
        }
    }

    /// Shares the store and embedder of an opened [`RagStore`].
    pub fn from_rag_store(rag: &RagStore) -> Self {
        Self::new(rag.store(), rag.embedder())
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn CompletionProvider>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    /// Retrieves up to `k` chunks within `distance_threshold` for a standalone question.
    ///
    /// # Errors
    /// [`ContextorError::Config`] for `k == 0` or a negative threshold (before any
    /// call is made); embedding and store failures otherwise.
    pub async fn retrieve(
        &self,
        question: &str,
        k: usize,
        distance_threshold: f32,
    ) -> Result<RetrievalResult, ContextorError> {
        self.retrieve_in_conversation(question, &[], k, distance_threshold)
            .await
    }

    /// Like [`QueryProcessor::retrieve`], first rewriting `question` into a
    /// standalone form when `history` is non-empty and a rewriter is set.
    pub async fn retrieve_in_conversation(
        &self,
        question: &str,
        history: &[ChatMessage],
        k: usize,
        distance_threshold: f32,
    ) -> Result<RetrievalResult, ContextorError> {
        validate_query_params(k, distance_threshold)?;

        let rewritten_query = self.rewrite(question, history).await;
        let text = rewritten_query.as_deref().unwrap_or(question);

        let vector = self.embedder.embed(text).await?;
        let raw = self.store.query(&vector, k).await?;
        let fetched = raw.len();
        let hits = filter_hits(raw, distance_threshold);

        if hits.is_empty() {
            info!(fetched, distance_threshold, "no relevant information found");
        } else {
            debug!(fetched, kept = hits.len(), "retrieval completed");
        }
        Ok(RetrievalResult {
            hits,
            rewritten_query,
        })
    }

    /// Standalone rewrite of `question`; `None` when skipped or failed.
    pub async fn rewrite(&self, question: &str, history: &[ChatMessage]) -> Option<String> {
        let rewriter = self.rewriter.as_ref()?;
        if history.is_empty() {
            return None;
        }
        let prompt = rewrite_prompt(history, question);
        match rewriter.complete(&prompt, None).await {
            Ok(text) if !text.trim().is_empty() => {
                let text = text.trim().to_string();
                debug!(original = %question, rewritten = %text, "query rewritten");
                Some(text)
            }
            Ok(_) => {
                warn!("query rewrite returned empty text; using original question");
                None
            }
            Err(e) => {
                warn!(error = %e, "query rewrite failed; using original question");
                None
            }
        }
    }
}

/// Keeps hits with `distance <= threshold`, ascending, ties in store order,
/// each id once.
pub fn filter_hits(mut hits: Vec<StoreHit>, distance_threshold: f32) -> Vec<StoreHit> {
    hits.retain(|h| h.distance <= distance_threshold);
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    let mut seen = HashSet::with_capacity(hits.len());
    hits.retain(|h| seen.insert(h.id.clone()));
    hits
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ai_llm_service::{AiLlmError, CompletionFuture};
    use rag_store::{ChunkMetadata, HashingEmbedder, InMemoryStore, StoredChunk};
    use spec_chunker::ChunkType;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Completion fake that returns scripted replies in order and records prompts.
    pub(crate) struct Scripted {
        replies: Mutex<Vec<Result<String, AiLlmError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        pub(crate) fn new(replies: Vec<Result<&str, ()>>) -> Self {
            let replies = replies
                .into_iter()
                .rev()
                .map(|r| r.map(str::to_string).map_err(|_| AiLlmError::Timeout(Duration::from_secs(1))))
                .collect();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl CompletionProvider for Scripted {
        fn complete<'a>(&'a self, prompt: &'a str, _system: Option<&'a str>) -> CompletionFuture<'a> {
            Box::pin(async move {
                self.prompts.lock().expect("lock").push(prompt.to_string());
                self.replies
                    .lock()
                    .expect("lock")
                    .pop()
                    .unwrap_or_else(|| Err(AiLlmError::Timeout(Duration::from_secs(1))))
            })
        }
    }

    pub(crate) const DIM: usize = 128;

    pub(crate) fn row(e: &HashingEmbedder, id: &str, text: &str) -> StoredChunk {
        StoredChunk {
            id: id.into(),
            embedding: e.vectorize(text),
            metadata: ChunkMetadata {
                source_spec: id.split('.').next().unwrap_or_default().into(),
                chunk_type: ChunkType::Endpoint,
                method: String::new(),
                path: String::new(),
            },
            content: text.into(),
        }
    }

    pub(crate) async fn processor() -> QueryProcessor {
        let e = Arc::new(HashingEmbedder::new(DIM).expect("dim"));
        let store = Arc::new(InMemoryStore::default());
        store
            .upsert(vec![
                row(&e, "ats.endpoint.POST./candidates", "POST /candidates create a candidate"),
                row(&e, "ats.endpoint.GET./candidates", "GET /candidates list candidates filter status"),
                row(&e, "hris.endpoint.GET./employees", "GET /employees list employees"),
            ])
            .await
            .expect("seed");
        QueryProcessor::new(store, e)
    }

    fn hit(id: &str, d: f32) -> StoreHit {
        StoreHit {
            id: id.into(),
            distance: d,
            metadata: ChunkMetadata {
                source_spec: "ats".into(),
                chunk_type: ChunkType::Schema,
                method: String::new(),
                path: String::new(),
            },
            content: String::new(),
        }
    }

    #[test]
    fn filter_is_ascending_stable_and_bounded() {
        let hits = vec![
            hit("c", 0.9),
            hit("a", 0.2),
            hit("b", 0.2),
            hit("a", 0.5),
            hit("far", 1.5),
        ];
        let out = filter_hits(hits, 1.0);
        let ids: Vec<&str> = out.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(out.iter().all(|h| h.distance <= 1.0));
    }

    #[tokio::test]
    async fn retrieve_ranks_best_match_first() {
        let p = processor().await;
        let r = p.retrieve("create a candidate", 3, 2.0).await.expect("retrieve");
        assert_eq!(r.ranked_ids()[0], "ats.endpoint.POST./candidates");
        assert!(r.scores().windows(2).all(|w| w[0] <= w[1]));
        assert!(r.rewritten_query.is_none());
    }

    #[tokio::test]
    async fn zero_threshold_yields_empty_result_not_error() {
        let p = processor().await;
        let r = p.retrieve("payroll runs", 3, 0.0).await.expect("retrieve");
        assert!(r.is_empty());
    }

    #[tokio::test]
    async fn invalid_params_fail_fast() {
        let p = processor().await;
        assert!(matches!(p.retrieve("q", 0, 1.0).await, Err(ContextorError::Config(_))));
        assert!(matches!(p.retrieve("q", 3, -1.0).await, Err(ContextorError::Config(_))));
    }

    #[tokio::test]
    async fn history_triggers_rewrite_and_failure_falls_back() {
        let fake = Arc::new(Scripted::new(vec![Ok("List candidates filtered by status"), Err(())]));
        let p = processor().await.with_rewriter(fake.clone());
        let history = vec![
            ChatMessage::user("How do I list candidates?"),
            ChatMessage::assistant("Use GET /candidates."),
        ];

        let r = p
            .retrieve_in_conversation("Can I filter it?", &history, 3, 2.0)
            .await
            .expect("retrieve");
        assert_eq!(r.rewritten_query.as_deref(), Some("List candidates filtered by status"));
        assert_eq!(r.ranked_ids()[0], "ats.endpoint.GET./candidates");

        let r = p
            .retrieve_in_conversation("Can I filter it?", &history, 3, 2.0)
            .await
            .expect("fallback still retrieves");
        assert!(r.rewritten_query.is_none());
        assert_eq!(fake.prompts.lock().expect("lock").len(), 2);

        // No history: no completion call.
        p.retrieve("create candidate", 3, 2.0).await.expect("retrieve");
        assert_eq!(fake.prompts.lock().expect("lock").len(), 2);
    }
}
