//! Process-local vector store with exact search.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::config::DistanceKind;
use crate::embed::EmbedFuture;
use crate::errors::RagError;
use crate::record::{StoreHit, StoredChunk};
use crate::vector_store::VectorStore;

#[derive(Default)]
struct Inner {
    rows: Vec<StoredChunk>,
    by_id: HashMap<String, usize>,
}

/// Exact nearest-neighbor store kept in memory.
///
/// Rows keep their first-insertion position, so equal distances are returned
/// in insertion order.
pub struct InMemoryStore {
    distance: DistanceKind,
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new(distance: DistanceKind) -> Self {
        Self {
            distance,
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(DistanceKind::Cosine)
    }
}

/// Distance between two equally sized vectors; smaller = more similar.
pub fn distance(kind: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    match kind {
        DistanceKind::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 {
                1.0
            } else {
                1.0 - dot / (na * nb)
            }
        }
        DistanceKind::Dot => -a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>(),
        DistanceKind::Euclid => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

impl VectorStore for InMemoryStore {
    fn upsert<'a>(&'a self, rows: Vec<StoredChunk>) -> EmbedFuture<'a, usize> {
        Box::pin(async move {
            let mut g = self.inner.write().await;
            let want = g
                .rows
                .first()
                .or(rows.first())
                .map(|r| r.embedding.len());
            if let Some(want) = want {
                if let Some(bad) = rows.iter().find(|r| r.embedding.len() != want) {
                    return Err(RagError::VectorSizeMismatch {
                        got: bad.embedding.len(),
                        want,
                    });
                }
            }
            let n = rows.len();
            for row in rows {
                match g.by_id.get(&row.id).copied() {
                    Some(pos) => g.rows[pos] = row,
                    None => {
                        let pos = g.rows.len();
                        g.by_id.insert(row.id.clone(), pos);
                        g.rows.push(row);
                    }
                }
            }
            debug!(upserted = n, total = g.rows.len(), "memory store upsert");
            Ok(n)
        })
    }

    fn query<'a>(&'a self, vector: &'a [f32], k: usize) -> EmbedFuture<'a, Vec<StoreHit>> {
        Box::pin(async move {
            let g = self.inner.read().await;
            if let Some(first) = g.rows.first() {
                if first.embedding.len() != vector.len() {
                    return Err(RagError::VectorSizeMismatch {
                        got: vector.len(),
                        want: first.embedding.len(),
                    });
                }
            }
            let mut scored: Vec<(f32, &StoredChunk)> = g
                .rows
                .iter()
                .map(|r| (distance(self.distance, vector, &r.embedding), r))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            Ok(scored
                .into_iter()
                .take(k)
                .map(|(d, r)| StoreHit {
                    id: r.id.clone(),
                    distance: d,
                    metadata: r.metadata.clone(),
                    content: r.content.clone(),
                })
                .collect())
        })
    }

    fn reset(&self) -> EmbedFuture<'_, ()> {
        Box::pin(async move {
            let mut g = self.inner.write().await;
            g.rows.clear();
            g.by_id.clear();
            Ok(())
        })
    }

    fn count(&self) -> EmbedFuture<'_, usize> {
        Box::pin(async move { Ok(self.inner.read().await.rows.len()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChunkMetadata;
    use spec_chunker::ChunkType;

    fn row(id: &str, v: Vec<f32>) -> StoredChunk {
        StoredChunk {
            id: id.into(),
            embedding: v,
            metadata: ChunkMetadata {
                source_spec: "ats".into(),
                chunk_type: ChunkType::Schema,
                method: String::new(),
                path: String::new(),
            },
            content: id.into(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_same_id() {
        let s = InMemoryStore::default();
        s.upsert(vec![row("a", vec![1.0, 0.0]), row("b", vec![0.0, 1.0])])
            .await
            .expect("upsert");
        s.upsert(vec![row("a", vec![0.0, 1.0])]).await.expect("upsert");
        assert_eq!(s.count().await.expect("count"), 2);
        let hits = s.query(&[0.0, 1.0], 5).await.expect("query");
        assert!(hits.iter().all(|h| h.distance.abs() < 1e-6));
    }

    #[tokio::test]
    async fn query_is_ascending_with_stable_ties() {
        let s = InMemoryStore::default();
        s.upsert(vec![
            row("far", vec![0.0, 1.0]),
            row("tie1", vec![1.0, 0.0]),
            row("tie2", vec![2.0, 0.0]),
        ])
        .await
        .expect("upsert");
        let hits = s.query(&[1.0, 0.0], 3).await.expect("query");
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["tie1", "tie2", "far"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(s.query(&[1.0, 0.0], 1).await.expect("query").len(), 1);
    }

    #[tokio::test]
    async fn reset_and_dimension_checks() {
        let s = InMemoryStore::default();
        s.upsert(vec![row("a", vec![1.0, 0.0])]).await.expect("upsert");
        assert!(s.upsert(vec![row("b", vec![1.0])]).await.is_err());
        assert!(s.query(&[1.0], 1).await.is_err());
        s.reset().await.expect("reset");
        assert_eq!(s.count().await.expect("count"), 0);
        assert!(s.query(&[1.0], 1).await.expect("empty store").is_empty());
    }

    #[test]
    fn distance_kinds() {
        assert!((distance(DistanceKind::Cosine, &[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(distance(DistanceKind::Euclid, &[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(distance(DistanceKind::Dot, &[1.0, 2.0], &[3.0, 4.0]), -11.0);
    }
}
