//! Retrieval knobs loaded from environment variables.

use crate::error::ContextorError;

pub const DEFAULT_TOP_K: usize = 5;
/// Cosine distance spans 0..2, so the default keeps every hit.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 2.0;

/// `k` and distance threshold used by `retrieve` when callers do not override them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub distance_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
        }
    }
}

impl RetrievalConfig {
    /// Reads `RAG_TOP_K` and `RAG_DISTANCE_THRESHOLD`, falling back to defaults.
    ///
    /// # Errors
    /// [`ContextorError::Config`] when a value does not parse or fails [`RetrievalConfig::validate`].
    pub fn from_env() -> Result<Self, ContextorError> {
        let mut cfg = Self::default();
        if let Some(v) = env("RAG_TOP_K") {
            cfg.top_k = v
                .parse()
                .map_err(|_| ContextorError::Config(format!("RAG_TOP_K: cannot parse '{v}'")))?;
        }
        if let Some(v) = env("RAG_DISTANCE_THRESHOLD") {
            cfg.distance_threshold = v.parse().map_err(|_| {
                ContextorError::Config(format!("RAG_DISTANCE_THRESHOLD: cannot parse '{v}'"))
            })?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        validate_query_params(self.top_k, self.distance_threshold)
    }
}

/// Rejects `k == 0` and negative or non-finite thresholds.
pub fn validate_query_params(k: usize, distance_threshold: f32) -> Result<(), ContextorError> {
    if k == 0 {
        return Err(ContextorError::Config("k must be > 0".into()));
    }
    if !distance_threshold.is_finite() || distance_threshold < 0.0 {
        return Err(ContextorError::Config(format!(
            "distance threshold must be a finite value >= 0, got {distance_threshold}"
        )));
    }
    Ok(())
}

fn env(k: &str) -> Option<String> {
    std::env::var(k)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
