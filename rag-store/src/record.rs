//! Data models exchanged with vector stores.

use serde::{Deserialize, Serialize};
use spec_chunker::{Chunk, ChunkType};
use uuid::Uuid;

use crate::errors::RagError;

/// Metadata stored next to every vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_spec: String,
    #[serde(rename = "type")]
    pub chunk_type: ChunkType,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
}

impl From<&Chunk> for ChunkMetadata {
    fn from(c: &Chunk) -> Self {
        Self {
            source_spec: c.source_spec.clone(),
            chunk_type: c.chunk_type,
            method: c.method.clone(),
            path: c.path.clone(),
        }
    }
}

/// One row to upsert: id, embedding, metadata, content.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredChunk {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
    /// Text returned to callers (prefix + content, as embedded).
    pub content: String,
}

impl StoredChunk {
    /// Converts a built chunk; the chunk must already carry its embedding.
    pub fn from_chunk(c: &Chunk) -> Result<Self, RagError> {
        let embedding = c.embedding.clone().ok_or(RagError::MissingEmbedding)?;
        Ok(Self {
            id: c.id.clone(),
            embedding,
            metadata: ChunkMetadata::from(c),
            content: c.embedding_text(),
        })
    }
}

/// A single nearest-neighbor hit. Smaller `distance` means more similar.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreHit {
    pub id: String,
    pub distance: f32,
    pub metadata: ChunkMetadata,
    pub content: String,
}

/// Deterministic UUIDv5 point id for a chunk id.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spec_chunker::ChunkKey;

    #[test]
    fn stable_uuid_is_deterministic() {
        let a = stable_uuid("ats.endpoint.POST./candidates");
        assert_eq!(a, stable_uuid("ats.endpoint.POST./candidates"));
        assert_ne!(a, stable_uuid("ats.endpoint.GET./candidates"));
    }

    #[test]
    fn stored_chunk_requires_embedding() {
        let mut c = Chunk::new(
            &ChunkKey::endpoint("ats", "POST", "/candidates"),
            "Endpoint: POST /candidates".into(),
            "Creates a candidate.".into(),
        );
        assert!(matches!(StoredChunk::from_chunk(&c), Err(RagError::MissingEmbedding)));

        c.embedding = Some(vec![1.0, 0.0]);
        let s = StoredChunk::from_chunk(&c).expect("embedded");
        assert_eq!(s.metadata.method, "POST");
        assert_eq!(s.content, "Creates a candidate.\n\nEndpoint: POST /candidates");
    }
}
