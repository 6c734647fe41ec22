//! Runtime and collection configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" => Ok(DistanceKind::Dot),
            "euclid" | "euclidean" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(RagError::Config(format!("unknown distance '{other}'"))),
        }
    }
}

/// Which vector store implementation backs the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Qdrant,
    /// Process-local store; contents are lost on exit.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(StoreBackend::Qdrant),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(RagError::Config(format!("unknown store backend '{other}'"))),
        }
    }
}

/// Describes the vector space of the collection.
#[derive(Clone, Debug)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// Configuration for ingestion and the vector store.
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub backend: StoreBackend,
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Upsert batch size.
    pub upsert_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    /// Expected embedding size; checked against every vector when set.
    pub embedding_dim: Option<usize>,
    /// Texts per embedding request.
    pub embedding_batch: usize,
    /// Embedding requests in flight.
    pub embedding_concurrency: usize,
    /// Per-request timeout when fetching remote spec documents.
    pub fetch_timeout: Duration,
}

impl RagConfig {
    /// Creates a default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Qdrant,
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            upsert_batch: 100,
            exact_search: false,
            embedding_dim: None,
            embedding_batch: 32,
            embedding_concurrency: 4,
            fetch_timeout: Duration::from_secs(20),
        }
    }

    /// Config for the in-memory store (tests, offline runs).
    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Self::new_default("memory://", "documents")
        }
    }

    /// Builds the config from environment variables.
    ///
    /// `RAG_STORE`, `QDRANT_URL`, `QDRANT_API_KEY`, `QDRANT_COLLECTION`,
    /// `QDRANT_DISTANCE`, `QDRANT_BATCH_SIZE`, `RAG_EXACT_SEARCH`, `EMBEDDING_DIM`,
    /// `EMBEDDING_BATCH`, `EMBEDDING_CONCURRENCY`, `SPEC_FETCH_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// [`RagError::Config`] for unparsable values or a failed [`RagConfig::validate`].
    pub fn from_env() -> Result<Self, RagError> {
        let mut cfg = Self::new_default(
            env("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".into()),
            env("QDRANT_COLLECTION").unwrap_or_else(|| "documents".into()),
        );
        if let Some(b) = env("RAG_STORE") {
            cfg.backend = b.parse()?;
        }
        cfg.qdrant_api_key = env("QDRANT_API_KEY");
        if let Some(d) = env("QDRANT_DISTANCE") {
            cfg.distance = d.parse()?;
        }
        if let Some(v) = parse_env::<usize>("QDRANT_BATCH_SIZE")? {
            cfg.upsert_batch = v;
        }
        if let Some(v) = parse_env::<bool>("RAG_EXACT_SEARCH")? {
            cfg.exact_search = v;
        }
        cfg.embedding_dim = parse_env::<usize>("EMBEDDING_DIM")?;
        if let Some(v) = parse_env::<usize>("EMBEDDING_BATCH")? {
            cfg.embedding_batch = v;
        }
        if let Some(v) = parse_env::<usize>("EMBEDDING_CONCURRENCY")? {
            cfg.embedding_concurrency = v;
        }
        if let Some(v) = parse_env::<u64>("SPEC_FETCH_TIMEOUT_SECS")? {
            cfg.fetch_timeout = Duration::from_secs(v);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.backend == StoreBackend::Qdrant && self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        if self.embedding_batch == 0 {
            return Err(RagError::Config("embedding_batch must be > 0".into()));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Config("embedding_concurrency must be > 0".into()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(RagError::Config("fetch_timeout must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        Ok(())
    }
}

fn env(k: &str) -> Option<String> {
    std::env::var(k).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(k: &str) -> Result<Option<T>, RagError> {
    match env(k) {
        None => Ok(None),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagError::Config(format!("{k}: cannot parse '{v}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_distance_and_backend() {
        assert_eq!("Cosine".parse::<DistanceKind>().ok(), Some(DistanceKind::Cosine));
        assert_eq!("l2".parse::<DistanceKind>().ok(), Some(DistanceKind::Euclid));
        assert!("manhattan".parse::<DistanceKind>().is_err());
        assert_eq!("memory".parse::<StoreBackend>().ok(), Some(StoreBackend::Memory));
    }

    #[test]
    fn validate_rejects_zero_knobs() {
        let mut cfg = RagConfig::in_memory();
        assert!(cfg.validate().is_ok());
        cfg.upsert_batch = 0;
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));

        let mut cfg = RagConfig::in_memory();
        cfg.embedding_dim = Some(0);
        assert!(cfg.validate().is_err());
    }
}
