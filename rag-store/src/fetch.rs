//! Where spec documents come from: local files or `http(s)://` URLs.

use std::path::PathBuf;
use std::time::Duration;

use spec_chunker::{ChunkError, RejectedUnit, SpecDocument};
use tracing::{debug, info, warn};

use crate::errors::RagError;

/// One ingestion source as given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecSource {
    Path(PathBuf),
    Url(String),
}

impl SpecSource {
    /// `http://` and `https://` become URLs, anything else a path.
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SpecSource::Url(s.trim().to_string())
        } else {
            SpecSource::Path(PathBuf::from(s))
        }
    }

    pub fn label(&self) -> String {
        match self {
            SpecSource::Path(p) => p.display().to_string(),
            SpecSource::Url(u) => u.clone(),
        }
    }
}

/// HTTP client for remote spec documents.
#[derive(Clone, Debug)]
pub struct SpecFetcher {
    client: reqwest::Client,
}

impl SpecFetcher {
    pub fn new(timeout: Duration) -> Result<Self, RagError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GETs `url` and parses the body as a spec document.
    pub async fn fetch(&self, url: &str) -> Result<SpecDocument, RagError> {
        let source_spec = SpecDocument::source_spec_from_url(url);
        debug!(url, source_spec = %source_spec, "fetching spec document");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RagError::Fetch(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RagError::Fetch(format!("HTTP {status}")));
        }
        let text = resp.text().await.map_err(|e| RagError::Fetch(e.to_string()))?;
        Ok(SpecDocument::from_json_str(source_spec, &text)?)
    }

    /// Loads every source in order. Sources that cannot be read, fetched or
    /// parsed are rejected, not fatal.
    pub async fn load(&self, sources: &[SpecSource]) -> (Vec<SpecDocument>, Vec<RejectedUnit>) {
        let mut docs = Vec::with_capacity(sources.len());
        let mut rejected = Vec::new();
        for src in sources {
            let res = match src {
                SpecSource::Path(p) => SpecDocument::from_path(p).map_err(RagError::from),
                SpecSource::Url(u) => self.fetch(u).await,
            };
            match res {
                Ok(d) => docs.push(d),
                Err(e) => {
                    warn!(source = %src.label(), error = %e, "skipping document");
                    rejected.push(RejectedUnit::new(src.label(), reject_reason(&e)));
                }
            }
        }
        info!(loaded = docs.len(), rejected = rejected.len(), "spec documents loaded");
        (docs, rejected)
    }
}

fn reject_reason(e: &RagError) -> String {
    match e {
        RagError::Chunk(ChunkError::InvalidDocument { reason, .. }) => reason.clone(),
        other => other.to_string(),
    }
}
