//! Thin adapter around `qdrant-client` implementing [`VectorStore`].
//!
//! All Qdrant interactions live here, hiding the builder API from the rest of
//! the workspace. Qdrant reports a *similarity* for cosine and dot collections
//! (larger = closer) and a *distance* for euclid; hits are converted so callers
//! always see `distance`, smaller = more similar.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue,
    VectorParamsBuilder, value,
};
use spec_chunker::ChunkType;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::{DistanceKind, RagConfig, VectorSpace};
use crate::embed::EmbedFuture;
use crate::errors::RagError;
use crate::record::{ChunkMetadata, StoreHit, StoredChunk, stable_uuid};
use crate::vector_store::VectorStore;

const F_CHUNK_ID: &str = "chunk_id";
const F_SOURCE: &str = "source_spec";
const F_TYPE: &str = "type";
const F_METHOD: &str = "method";
const F_PATH: &str = "path";
const F_CONTENT: &str = "content";

/// A facade over the Qdrant client bound to one collection.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
    exact: bool,
    upsert_batch: usize,
    /// Set once the collection is known to exist; cleared on reset.
    ready: Mutex<bool>,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration. No network call is made.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(qerr)?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
            exact: cfg.exact_search,
            upsert_batch: cfg.upsert_batch,
            ready: Mutex::new(false),
        })
    }

    /// Ensures that the collection exists, creating it with `space` if missing.
    pub async fn ensure_collection(&self, space: &VectorSpace) -> Result<(), RagError> {
        let mut ready = self.ready.lock().await;
        if *ready {
            return Ok(());
        }
        if self.client.collection_exists(self.collection.as_str()).await.map_err(qerr)? {
            debug!(collection = %self.collection, "collection already exists");
            *ready = true;
            return Ok(());
        }

        info!(
            collection = %self.collection,
            size = space.size,
            distance = ?space.distance,
            "creating collection"
        );
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(space.size as u64, to_qdrant(space.distance)),
                ),
            )
            .await
            .map_err(qerr)?;
        *ready = true;
        Ok(())
    }

    fn to_point(&self, row: StoredChunk) -> PointStruct {
        let m = &row.metadata;
        let mut payload: HashMap<String, QValue> = HashMap::new();
        payload.insert(F_CHUNK_ID.into(), qstring(&row.id));
        payload.insert(F_SOURCE.into(), qstring(&m.source_spec));
        payload.insert(F_TYPE.into(), qstring(m.chunk_type.as_str()));
        payload.insert(F_METHOD.into(), qstring(&m.method));
        payload.insert(F_PATH.into(), qstring(&m.path));
        payload.insert(F_CONTENT.into(), qstring(&row.content));

        PointStruct {
            id: Some(stable_uuid(&row.id).to_string().into()),
            payload,
            vectors: Some(row.embedding.into()),
            ..Default::default()
        }
    }

    /// Qdrant score → distance (smaller = closer).
    fn to_distance(&self, score: f32) -> f32 {
        score_to_distance(self.distance, score)
    }
}

pub(crate) fn score_to_distance(kind: DistanceKind, score: f32) -> f32 {
    match kind {
        DistanceKind::Cosine => 1.0 - score,
        DistanceKind::Dot => -score,
        DistanceKind::Euclid => score,
    }
}

impl VectorStore for QdrantFacade {
    fn upsert<'a>(&'a self, rows: Vec<StoredChunk>) -> EmbedFuture<'a, usize> {
        Box::pin(async move {
            let Some(first) = rows.first() else {
                debug!("no points provided for upsert");
                return Ok(0);
            };
            self.ensure_collection(&VectorSpace {
                size: first.embedding.len(),
                distance: self.distance,
            })
            .await?;

            let n = rows.len();
            let points: Vec<PointStruct> = rows.into_iter().map(|r| self.to_point(r)).collect();
            for batch in points.chunks(self.upsert_batch.max(1)) {
                self.client
                    .upsert_points(
                        UpsertPointsBuilder::new(&self.collection, batch.to_vec()).wait(true),
                    )
                    .await
                    .map_err(qerr)?;
            }
            info!(collection = %self.collection, points = n, "upserted points");
            Ok(n)
        })
    }

    fn query<'a>(&'a self, vector: &'a [f32], k: usize) -> EmbedFuture<'a, Vec<StoreHit>> {
        Box::pin(async move {
            if !*self.ready.lock().await
                && !self.client.collection_exists(self.collection.as_str()).await.map_err(qerr)?
            {
                debug!(collection = %self.collection, "query on missing collection");
                return Ok(Vec::new());
            }

            let mut builder = SearchPointsBuilder::new(&self.collection, vector.to_vec(), k as u64)
                .with_payload(true);
            if self.exact {
                builder = builder.params(SearchParamsBuilder::default().exact(true));
            }
            let res = self.client.search_points(builder).await.map_err(qerr)?;

            let mut out = Vec::with_capacity(res.result.len());
            for p in res.result {
                match hit_from_payload(p.payload, self.to_distance(p.score)) {
                    Some(hit) => out.push(hit),
                    None => warn!(collection = %self.collection, "skipping point with incomplete payload"),
                }
            }
            debug!(hits = out.len(), "search completed");
            Ok(out)
        })
    }

    fn reset(&self) -> EmbedFuture<'_, ()> {
        Box::pin(async move {
            let mut ready = self.ready.lock().await;
            if self.client.collection_exists(self.collection.as_str()).await.map_err(qerr)? {
                info!(collection = %self.collection, "deleting collection");
                self.client
                    .delete_collection(self.collection.as_str())
                    .await
                    .map_err(qerr)?;
            }
            *ready = false;
            Ok(())
        })
    }

    fn count(&self) -> EmbedFuture<'_, usize> {
        Box::pin(async move {
            if !self.client.collection_exists(self.collection.as_str()).await.map_err(qerr)? {
                return Ok(0);
            }
            let res = self
                .client
                .count(CountPointsBuilder::new(&self.collection).exact(true))
                .await
                .map_err(qerr)?;
            Ok(res.result.map(|r| r.count as usize).unwrap_or(0))
        })
    }
}

fn to_qdrant(d: DistanceKind) -> Distance {
    match d {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

fn qerr(e: impl std::fmt::Display) -> RagError {
    RagError::Qdrant(e.to_string())
}

/// Wraps a string into Qdrant `Value`.
fn qstring(s: &str) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s.to_string())),
    }
}

fn payload_str(p: &HashMap<String, QValue>, key: &str) -> Option<String> {
    match p.get(key).and_then(|v| v.kind.as_ref()) {
        Some(value::Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Rebuilds a hit from a stored payload; `None` if required fields are missing.
fn hit_from_payload(p: HashMap<String, QValue>, distance: f32) -> Option<StoreHit> {
    let chunk_type = ChunkType::from_tag(&payload_str(&p, F_TYPE)?)?;
    Some(StoreHit {
        id: payload_str(&p, F_CHUNK_ID)?,
        distance,
        metadata: ChunkMetadata {
            source_spec: payload_str(&p, F_SOURCE)?,
            chunk_type,
            method: payload_str(&p, F_METHOD).unwrap_or_default(),
            path: payload_str(&p, F_PATH).unwrap_or_default(),
        },
        content: payload_str(&p, F_CONTENT).unwrap_or_default(),
    })
}
