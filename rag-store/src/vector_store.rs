//! Abstract vector store used by ingestion and retrieval.

use std::sync::Arc;

use crate::config::{RagConfig, StoreBackend};
use crate::embed::EmbedFuture;
use crate::errors::RagError;
use crate::memory_store::InMemoryStore;
use crate::qdrant_facade::QdrantFacade;
use crate::record::{StoreHit, StoredChunk};

/// Persists chunks keyed by id and answers nearest-neighbor queries.
///
/// Implementations must:
/// - overwrite on `upsert` of an existing id (never duplicate)
/// - return hits in ascending `distance` order, ties in store order
pub trait VectorStore: Send + Sync {
    /// Inserts or replaces rows; returns how many were written.
    fn upsert<'a>(&'a self, rows: Vec<StoredChunk>) -> EmbedFuture<'a, usize>;

    /// Up to `k` nearest rows to `vector`.
    fn query<'a>(&'a self, vector: &'a [f32], k: usize) -> EmbedFuture<'a, Vec<StoreHit>>;

    /// Drops every row.
    fn reset(&self) -> EmbedFuture<'_, ()>;

    /// Number of stored rows.
    fn count(&self) -> EmbedFuture<'_, usize>;
}

/// Opens the store selected by `cfg.backend`.
pub fn open_store(cfg: &RagConfig) -> Result<Arc<dyn VectorStore>, RagError> {
    cfg.validate()?;
    Ok(match cfg.backend {
        StoreBackend::Qdrant => Arc::new(QdrantFacade::new(cfg)?),
        StoreBackend::Memory => Arc::new(InMemoryStore::new(cfg.distance)),
    })
}
