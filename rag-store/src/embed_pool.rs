//! Batched embedding executor with concurrency and dimension checks.

use futures::stream::{self, StreamExt};
use spec_chunker::Chunk;
use tracing::{debug, info};

use crate::{embed::EmbeddingsProvider, errors::RagError};

/// Fills `embedding` for every chunk that has none.
///
/// Texts are sent in batches of `batch_size`, with at most `concurrency`
/// batches in flight. The embedded text is [`Chunk::embedding_text`].
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if a vector has the wrong size
/// (against `expected_dim`, or against the first vector when unset), or the
/// provider error if a batch fails.
pub async fn embed_missing(
    chunks: &mut [Chunk],
    provider: &dyn EmbeddingsProvider,
    expected_dim: Option<usize>,
    batch_size: usize,
    concurrency: usize,
) -> Result<(), RagError> {
    let idxs: Vec<usize> = chunks
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.embedding.is_none().then_some(i))
        .collect();

    if idxs.is_empty() {
        debug!("embed_pool::embed_missing: nothing to embed");
        return Ok(());
    }
    info!(
        total = idxs.len(),
        batch_size, concurrency, "embed_pool::embed_missing"
    );

    let batches: Vec<(Vec<usize>, Vec<String>)> = idxs
        .chunks(batch_size.max(1))
        .map(|b| {
            let texts = b.iter().map(|&i| chunks[i].embedding_text()).collect();
            (b.to_vec(), texts)
        })
        .collect();

    let results: Vec<(Vec<usize>, Vec<Vec<f32>>)> = stream::iter(batches)
        .map(|(ids, texts)| async move {
            let vs = provider.embed_batch(&texts).await?;
            if vs.len() != ids.len() {
                return Err(RagError::Config(format!(
                    "provider returned {} vectors for {} texts",
                    vs.len(),
                    ids.len()
                )));
            }
            Ok::<_, RagError>((ids, vs))
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>, RagError>>()?;

    let mut want = expected_dim;
    for (ids, vs) in results {
        for (i, v) in ids.into_iter().zip(vs) {
            match want {
                Some(w) if v.len() != w => {
                    return Err(RagError::VectorSizeMismatch { got: v.len(), want: w });
                }
                None => want = Some(v.len()),
                _ => {}
            }
            chunks[i].embedding = Some(v);
        }
    }

    debug!("embed_pool::embed_missing: embeddings filled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::hashing::HashingEmbedder;
    use crate::embed::noop_embedder::NoopEmbedder;
    use spec_chunker::ChunkKey;

    fn chunks(n: usize) -> Vec<Chunk> {
        (0..n)
            .map(|i| {
                Chunk::new(
                    &ChunkKey::schema("ats", &format!("S{i}")),
                    format!("Schema: S{i}"),
                    String::new(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn fills_every_missing_embedding_across_batches() {
        let mut cs = chunks(7);
        cs[3].embedding = Some(vec![0.0; 16]);
        let e = HashingEmbedder::new(16).expect("dim");
        embed_missing(&mut cs, &e, Some(16), 2, 3).await.expect("embedded");
        assert!(cs.iter().all(|c| c.embedding.as_ref().is_some_and(|v| v.len() == 16)));
        assert_eq!(cs[0].embedding.as_deref(), Some(e.vectorize("Schema: S0").as_slice()));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_error() {
        let mut cs = chunks(2);
        let e = HashingEmbedder::new(8).expect("dim");
        let err = embed_missing(&mut cs, &e, Some(16), 4, 1).await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 8, want: 16 }));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let mut cs = chunks(1);
        let err = embed_missing(&mut cs, &NoopEmbedder, None, 4, 1).await.unwrap_err();
        assert!(matches!(err, RagError::MissingEmbedding));
    }
}
