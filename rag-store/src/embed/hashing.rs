//! Offline embedder based on feature hashing of word tokens.
//!
//! No network, fully deterministic: identical text always maps to the identical
//! vector, and texts sharing tokens land close under cosine distance. Used by
//! tests in place of the embedding gateway.

use sha2::{Digest, Sha256};

use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::RagError;

/// Feature-hashing embedder producing L2-normalized vectors of size `dim`.
#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self, RagError> {
        if dim == 0 {
            return Err(RagError::Config("hashing embedder dim must be > 0".into()));
        }
        Ok(Self { dim })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Synchronous core used by the async trait methods.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut head = [0u8; 8];
            head.copy_from_slice(&digest[..8]);
            let h = u64::from_le_bytes(head);
            let bucket = (h % self.dim as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl EmbeddingsProvider for HashingEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move { Ok(self.vectorize(text)) })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(texts.iter().map(|t| self.vectorize(t)).collect()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cos(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn deterministic_and_normalized() {
        let e = HashingEmbedder::new(64).expect("dim");
        let a = e.vectorize("Create a candidate");
        assert_eq!(a, e.vectorize("create A CANDIDATE"));
        assert!((cos(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_tokens_are_closer() {
        let e = HashingEmbedder::new(256).expect("dim");
        let q = e.vectorize("create candidate");
        let near = e.vectorize("POST /candidates create candidate record");
        let far = e.vectorize("list employees time off balances");
        assert!(cos(&q, &near) > cos(&q, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let e = HashingEmbedder::new(8).expect("dim");
        assert!(e.vectorize("  ").iter().all(|x| *x == 0.0));
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[tokio::test]
    async fn batch_matches_single() {
        let e = HashingEmbedder::new(32).expect("dim");
        let texts = vec!["a b".to_string(), "c".to_string()];
        let batch = e.embed_batch(&texts).await.expect("embedded");
        assert_eq!(batch[1], e.embed("c").await.expect("embedded"));
    }
}
