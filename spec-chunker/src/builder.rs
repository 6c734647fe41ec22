//! Chunk Builder: parsed units + contextualization → immutable [`Chunk`]s.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::chunk::Chunk;
use crate::contextualizer::{Contextualizer, Situated};
use crate::document::SpecDocument;
use crate::error::RejectedUnit;
use crate::parser::parse_document;

/// Chunks produced from one document plus what was skipped along the way.
#[derive(Clone, Debug, Default)]
pub struct BuiltChunks {
    pub chunks: Vec<Chunk>,
    pub rejected: Vec<RejectedUnit>,
    /// Chunks stored with an empty prefix because contextualization failed.
    pub contextualization_fallbacks: usize,
}

/// Turns documents into chunks, one per logical unit.
#[derive(Clone)]
pub struct ChunkBuilder {
    contextualizer: Contextualizer,
}

impl ChunkBuilder {
    pub fn new(contextualizer: Contextualizer) -> Self {
        Self { contextualizer }
    }

    /// Builds every chunk of `doc`. Rejected units are reported, never fatal.
    ///
    /// Ids are content-derived, so running this twice on the same document
    /// yields the same ids and content (prefixes depend on the model).
    pub async fn build_chunks(&self, doc: &SpecDocument) -> BuiltChunks {
        let parsed = parse_document(doc);
        let mut rejected = parsed.rejected;

        let mut seen = HashSet::with_capacity(parsed.units.len());
        let mut units = Vec::with_capacity(parsed.units.len());
        for unit in parsed.units {
            let id = unit.key.id();
            if seen.insert(id.clone()) {
                units.push(unit);
            } else {
                rejected.push(RejectedUnit::new(id, "duplicate logical unit"));
            }
        }

        let summary = parsed.summary.render();
        let contents: Vec<String> = units.iter().map(|u| u.content.clone()).collect();
        let situated = self.contextualizer.situate_all(&summary, &contents).await;

        let mut fallbacks = 0usize;
        let chunks: Vec<Chunk> = units
            .into_iter()
            .zip(situated)
            .map(|(unit, s)| {
                if s == Situated::Fallback {
                    fallbacks += 1;
                }
                Chunk::new(&unit.key, unit.content, s.into_prefix())
            })
            .collect();

        if fallbacks > 0 {
            warn!(
                source_spec = %doc.source_spec,
                fallbacks,
                "some chunks were stored without context prefix"
            );
        }
        info!(
            source_spec = %doc.source_spec,
            chunks = chunks.len(),
            rejected = rejected.len(),
            "chunks built"
        );

        BuiltChunks {
            chunks,
            rejected,
            contextualization_fallbacks: fallbacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkType;
    use crate::contextualizer::tests::Scripted;
    use serde_json::json;
    use std::sync::Arc;

    fn doc() -> SpecDocument {
        SpecDocument::new(
            "ats",
            json!({
                "info": { "title": "ATS", "version": "1" },
                "paths": {
                    "/candidates": {
                        "get": { "summary": "List" },
                        "post": { "summary": "Create" }
                    }
                },
                "components": {
                    "schemas": { "Candidate": { "type": "object" } },
                    "securitySchemes": { "basic": { "type": "http", "scheme": "basic" } }
                }
            }),
        )
        .expect("valid document")
    }

    #[tokio::test]
    async fn builds_one_chunk_per_unit_with_prefix() {
        let fake = Arc::new(Scripted::new(vec![Ok("Part of the ATS API.")]));
        let builder = ChunkBuilder::new(Contextualizer::new(fake, 4));
        let out = builder.build_chunks(&doc()).await;

        assert_eq!(out.chunks.len(), 4);
        assert_eq!(out.contextualization_fallbacks, 0);
        assert!(out.chunks.iter().all(|c| c.context_prefix == "Part of the ATS API."));
        let endpoint = &out.chunks[1];
        assert_eq!(endpoint.id, "ats.endpoint.POST./candidates");
        assert_eq!(endpoint.chunk_type, ChunkType::Endpoint);
        assert_eq!((endpoint.method.as_str(), endpoint.path.as_str()), ("POST", "/candidates"));
        let schema = &out.chunks[2];
        assert!(schema.method.is_empty() && schema.path.is_empty());
        assert_eq!(schema.schema_name, "Candidate");
    }

    #[tokio::test]
    async fn failed_contextualization_keeps_chunk_with_empty_prefix() {
        let fake = Arc::new(Scripted::new(vec![Err(())]));
        let builder = ChunkBuilder::new(Contextualizer::new(fake, 2));
        let out = builder.build_chunks(&doc()).await;

        assert_eq!(out.chunks.len(), 4);
        assert_eq!(out.contextualization_fallbacks, 4);
        assert!(out.chunks.iter().all(|c| c.context_prefix.is_empty()));
        assert_eq!(out.chunks[0].embedding_text(), out.chunks[0].content);
    }

    #[tokio::test]
    async fn rebuilding_is_idempotent() {
        let builder = ChunkBuilder::new(Contextualizer::disabled());
        let a = builder.build_chunks(&doc()).await;
        let b = builder.build_chunks(&doc()).await;
        assert_eq!(a.chunks, b.chunks);
        assert_eq!(a.contextualization_fallbacks, 0);
    }
}
