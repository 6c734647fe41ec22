//! End-to-end ingestion pipeline: document → chunks → embeddings → upsert.
//!
//! Documents are processed one after another; within a document the
//! contextualization and embedding calls run with bounded concurrency.
//! Upserts are keyed by deterministic chunk id, so re-running is idempotent.

use serde::Serialize;
use spec_chunker::{ChunkBuilder, RejectedUnit, SpecDocument};
use tracing::{debug, info};

use crate::config::RagConfig;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_missing;
use crate::errors::RagError;
use crate::progress::Progress;
use crate::record::StoredChunk;
use crate::vector_store::VectorStore;

/// Outcome of one ingestion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks_built: usize,
    pub upserted: usize,
    /// Units (or whole documents) skipped, with reasons.
    pub rejected: Vec<RejectedUnit>,
    pub contextualization_fallbacks: usize,
}

impl IngestReport {
    fn absorb(&mut self, other: IngestReport) {
        self.documents += other.documents;
        self.chunks_built += other.chunks_built;
        self.upserted += other.upserted;
        self.rejected.extend(other.rejected);
        self.contextualization_fallbacks += other.contextualization_fallbacks;
    }
}

/// Ingests one document: build chunks, embed them, upsert them.
///
/// # Errors
/// Embedding or store failures abort this document; rejected units do not.
pub async fn ingest_document(
    cfg: &RagConfig,
    doc: &SpecDocument,
    builder: &ChunkBuilder,
    embedder: &dyn EmbeddingsProvider,
    store: &dyn VectorStore,
) -> Result<IngestReport, RagError> {
    debug!(source_spec = %doc.source_spec, "ingesting document");
    let built = builder.build_chunks(doc).await;
    let mut chunks = built.chunks;

    embed_missing(
        &mut chunks,
        embedder,
        cfg.embedding_dim,
        cfg.embedding_batch,
        cfg.embedding_concurrency,
    )
    .await?;

    let rows = chunks
        .iter()
        .map(StoredChunk::from_chunk)
        .collect::<Result<Vec<_>, _>>()?;
    let upserted = store.upsert(rows).await?;

    info!(
        source_spec = %doc.source_spec,
        chunks = chunks.len(),
        upserted,
        rejected = built.rejected.len(),
        "document ingested"
    );
    Ok(IngestReport {
        documents: 1,
        chunks_built: chunks.len(),
        upserted,
        rejected: built.rejected,
        contextualization_fallbacks: built.contextualization_fallbacks,
    })
}

/// Ingests every document in order, reporting progress per document.
pub async fn ingest_all(
    cfg: &RagConfig,
    documents: &[SpecDocument],
    builder: &ChunkBuilder,
    embedder: &dyn EmbeddingsProvider,
    store: &dyn VectorStore,
    progress: &dyn Progress,
) -> Result<IngestReport, RagError> {
    progress.set_total(documents.len() as u64);
    let mut report = IngestReport::default();
    for doc in documents {
        progress.message(&doc.source_spec);
        let one = ingest_document(cfg, doc, builder, embedder, store).await?;
        report.absorb(one);
        progress.step(&doc.source_spec);
    }
    progress.finish(&format!("{} chunks upserted", report.upserted));
    info!(
        documents = report.documents,
        chunks = report.chunks_built,
        upserted = report.upserted,
        rejected = report.rejected.len(),
        fallbacks = report.contextualization_fallbacks,
        "ingestion finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::hashing::HashingEmbedder;
    use crate::memory_store::InMemoryStore;
    use crate::progress::NoopProgress;
    use serde_json::json;
    use spec_chunker::Contextualizer;

    fn doc() -> SpecDocument {
        SpecDocument::new(
            "ats",
            json!({
                "info": { "title": "ATS", "version": "1" },
                "paths": {
                    "/candidates": {
                        "get": { "summary": "List candidates" },
                        "post": { "summary": "Create a candidate" }
                    }
                },
                "components": {
                    "schemas": { "Candidate": { "type": "object", "properties": { "id": { "type": "string" } } } },
                    "securitySchemes": { "basic": { "type": "http", "scheme": "basic" } }
                }
            }),
        )
        .expect("valid document")
    }

    async fn ids(store: &InMemoryStore, e: &HashingEmbedder) -> Vec<String> {
        let q = e.vectorize("candidate");
        let mut ids: Vec<String> = store
            .query(&q, 100)
            .await
            .expect("query")
            .into_iter()
            .map(|h| h.id)
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn ingest_is_idempotent() {
        let cfg = RagConfig::in_memory();
        let builder = ChunkBuilder::new(Contextualizer::disabled());
        let e = HashingEmbedder::new(64).expect("dim");
        let store = InMemoryStore::default();
        let docs = vec![doc()];

        let first = ingest_all(&cfg, &docs, &builder, &e, &store, &NoopProgress)
            .await
            .expect("ingest");
        assert_eq!(first.documents, 1);
        assert_eq!(first.chunks_built, 4);
        assert_eq!(first.upserted, 4);
        let before = ids(&store, &e).await;

        ingest_all(&cfg, &docs, &builder, &e, &store, &NoopProgress)
            .await
            .expect("ingest");
        assert_eq!(store.count().await.expect("count"), 4);
        assert_eq!(ids(&store, &e).await, before);
        assert!(before.contains(&"ats.endpoint.POST./candidates".to_string()));
        assert!(before.contains(&"ats.security".to_string()));
    }

    #[tokio::test]
    async fn dimension_check_aborts_before_upsert() {
        let mut cfg = RagConfig::in_memory();
        cfg.embedding_dim = Some(128);
        let builder = ChunkBuilder::new(Contextualizer::disabled());
        let e = HashingEmbedder::new(64).expect("dim");
        let store = InMemoryStore::default();

        let err = ingest_document(&cfg, &doc(), &builder, &e, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { .. }));
        assert_eq!(store.count().await.expect("count"), 0);
    }
}
