//! Vector storage and ingestion for specification chunks.
//!
//! This crate provides:
//! - [`EmbeddingsProvider`] backed by the LLM gateway (or an offline hashing embedder)
//! - [`VectorStore`] with a Qdrant facade and an in-memory implementation
//! - the ingestion pipeline: document → chunks → embeddings → upsert
//!
//! [`RagStore`] wires these together and is the recommended entry point.

mod config;
mod embed;
mod embed_pool;
mod errors;
mod fetch;
mod ingest;
mod memory_store;
mod progress;
mod qdrant_facade;
mod record;
mod vector_store;

use std::sync::Arc;

pub use config::{DistanceKind, RagConfig, StoreBackend, VectorSpace};
pub use embed::gateway::GatewayEmbedder;
pub use embed::hashing::HashingEmbedder;
pub use embed::noop_embedder::NoopEmbedder;
pub use embed::{EmbedFuture, EmbeddingsProvider};
pub use embed_pool::embed_missing;
pub use errors::RagError;
pub use fetch::{SpecFetcher, SpecSource};
pub use ingest::IngestReport;
pub use memory_store::{InMemoryStore, distance};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use qdrant_facade::QdrantFacade;
pub use record::{ChunkMetadata, StoreHit, StoredChunk, stable_uuid};
pub use vector_store::{VectorStore, open_store};

use spec_chunker::{ChunkBuilder, SpecDocument};
use tracing::{info, trace, warn};

/// High-level facade that wires configuration, store and embedder.
#[derive(Clone)]
pub struct RagStore {
    cfg: RagConfig,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl RagStore {
    /// Opens the store selected by `cfg.backend`.
    ///
    /// # Errors
    /// Returns `RagError::Config` if validation or client initialization fails.
    pub fn new(cfg: RagConfig, embedder: Arc<dyn EmbeddingsProvider>) -> Result<Self, RagError> {
        trace!(collection = %cfg.collection, backend = ?cfg.backend, "RagStore::new");
        let store = open_store(&cfg)?;
        Ok(Self {
            cfg,
            store,
            embedder,
        })
    }

    /// Uses an already-constructed store.
    pub fn with_store(
        cfg: RagConfig,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            store,
            embedder,
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub fn store(&self) -> Arc<dyn VectorStore> {
        Arc::clone(&self.store)
    }

    pub fn embedder(&self) -> Arc<dyn EmbeddingsProvider> {
        Arc::clone(&self.embedder)
    }

    /// Upserts every chunk of every document. Idempotent.
    ///
    /// # Errors
    /// Embedding, dimension or store failures.
    pub async fn ingest(
        &self,
        builder: &ChunkBuilder,
        documents: &[SpecDocument],
        progress: &dyn Progress,
    ) -> Result<IngestReport, RagError> {
        ingest::ingest_all(
            &self.cfg,
            documents,
            builder,
            self.embedder.as_ref(),
            self.store.as_ref(),
            progress,
        )
        .await
    }

    /// Drops every stored chunk, then ingests `documents`.
    pub async fn reload(
        &self,
        builder: &ChunkBuilder,
        documents: &[SpecDocument],
        progress: &dyn Progress,
    ) -> Result<IngestReport, RagError> {
        info!(collection = %self.cfg.collection, "resetting store before ingest");
        self.store.reset().await?;
        self.ingest(builder, documents, progress).await
    }

    /// Reads or fetches every source and ingests the documents; sources that
    /// fail to load end up in the report's `rejected` list.
    ///
    /// With `reset`, the store is only wiped when at least one document loaded.
    pub async fn ingest_sources(
        &self,
        builder: &ChunkBuilder,
        sources: &[SpecSource],
        reset: bool,
        progress: &dyn Progress,
    ) -> Result<IngestReport, RagError> {
        let fetcher = SpecFetcher::new(self.cfg.fetch_timeout)?;
        let (docs, rejected) = fetcher.load(sources).await;
        let mut report = if reset && docs.is_empty() && !rejected.is_empty() {
            warn!(rejected = rejected.len(), "no document loaded; keeping existing collection");
            IngestReport::default()
        } else if reset {
            self.reload(builder, &docs, progress).await?
        } else {
            self.ingest(builder, &docs, progress).await?
        };
        report.rejected.splice(0..0, rejected);
        Ok(report)
    }

    /// Embeds `text` and returns up to `k` nearest chunks, ascending distance.
    pub async fn search(&self, text: &str, k: usize) -> Result<Vec<StoreHit>, RagError> {
        let v = self.embedder.embed(text).await?;
        self.store.query(&v, k).await
    }

    pub async fn count(&self) -> Result<usize, RagError> {
        self.store.count().await
    }
}
