//! Chunker configuration loaded from environment variables.

use crate::error::ChunkError;

/// Knobs for the ingestion-side chunk builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Max contextualization calls in flight (`CONTEXT_CONCURRENCY`, default 4).
    pub context_concurrency: usize,
    /// Whether to call the LLM for context prefixes (`CONTEXTUALIZE`, default true).
    pub contextualize: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            context_concurrency: 4,
            contextualize: true,
        }
    }
}

impl ChunkerConfig {
    /// Reads `CONTEXT_CONCURRENCY` and `CONTEXTUALIZE`.
    ///
    /// # Errors
    /// [`ChunkError::Config`] when a variable is set but unparsable or zero.
    pub fn from_env() -> Result<Self, ChunkError> {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("CONTEXT_CONCURRENCY") {
            cfg.context_concurrency = v.trim().parse().map_err(|_| {
                ChunkError::Config(format!("CONTEXT_CONCURRENCY: expected integer, got '{v}'"))
            })?;
        }
        if let Ok(v) = std::env::var("CONTEXTUALIZE") {
            cfg.contextualize = parse_bool(&v).ok_or_else(|| {
                ChunkError::Config(format!("CONTEXTUALIZE: expected true/false, got '{v}'"))
            })?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.context_concurrency == 0 {
            return Err(ChunkError::Config("context_concurrency must be > 0".into()));
        }
        Ok(())
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
