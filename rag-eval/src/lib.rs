//! Retrieval quality evaluation over a labeled query set.
//!
//! [`evaluate`] retrieves each [`TestQuery`] once at the largest K, scores
//! Precision/Recall/F1/NDCG/HitRate at every K plus MRR, and aggregates the
//! results overall and per category into an [`AggregateReport`].

mod config;
mod dataset;
mod engine;
mod error;
mod metrics;
mod report;
mod retriever;

pub use config::{DEFAULT_K_VALUES, EvalConfig, parse_k_values};
pub use dataset::{RejectedQuery, TestQuery, load_dataset, partition_valid};
pub use engine::evaluate;
pub use error::EvalError;
pub use metrics::{MetricsAtK, QueryMetrics, relevance_flags, score_query};
pub use report::{AggregateReport, EvaluationRecord, FailedQuery, MetricSummary};
pub use retriever::{FnRetriever, ProcessorRetriever, Ranking, RetrieveFuture, Retriever};

#[cfg(test)]
mod tests {
    use super::*;
    use contextor::QueryProcessor;
    use rag_store::{HashingEmbedder, NoopProgress, RagConfig, RagStore};
    use serde_json::json;
    use spec_chunker::{ChunkBuilder, Contextualizer, SpecDocument};
    use std::sync::Arc;

    async fn ingested() -> RagStore {
        let e = Arc::new(HashingEmbedder::new(256).expect("dim"));
        let store = RagStore::new(RagConfig::in_memory(), e).expect("store");
        let doc = SpecDocument::new(
            "ats",
            json!({
                "info": { "title": "ATS", "version": "1.0" },
                "paths": {
                    "/candidates": {
                        "post": { "summary": "Create a candidate" },
                        "get": { "summary": "List candidates" }
                    },
                    "/jobs": { "get": { "summary": "List job postings" } }
                },
                "components": {
                    "schemas": {
                        "Candidate": {
                            "type": "object",
                            "properties": { "email": { "type": "string" } }
                        }
                    },
                    "securitySchemes": { "apiKey": { "type": "apiKey", "in": "header", "name": "x-api-key" } }
                }
            }),
        )
        .expect("doc");
        let builder = ChunkBuilder::new(Contextualizer::disabled());
        store.ingest(&builder, &[doc], &NoopProgress).await.expect("ingest");
        store
    }

    #[tokio::test]
    async fn evaluates_the_full_pipeline() {
        let store = ingested().await;
        let retriever = ProcessorRetriever::new(QueryProcessor::from_rag_store(&store), 2.0);
        let queries = vec![
            TestQuery::new("create a candidate", "endpoint", ["ats.endpoint.POST./candidates"]),
            TestQuery::new("list job postings", "endpoint", ["ats.endpoint.GET./jobs"]),
            TestQuery::new("api key header", "auth", ["ats.security"]),
        ];
        let cfg = EvalConfig::default().with_k_values(vec![1, 3, 5]);

        let report = evaluate(&queries, &retriever, &cfg, &NoopProgress).await.expect("report");
        assert_eq!(report.evaluated, 3);
        assert!(report.failed.is_empty());

        let overall = report.overall.as_ref().expect("overall");
        // Every labeled chunk exists among the 5 stored ones.
        assert_eq!(overall.at(5).expect("k=5").recall, 1.0);
        assert!(overall.mrr > 0.0);
        assert_eq!(report.per_category["auth"].queries, 1);
        for r in &report.records {
            assert!(r.scores.windows(2).all(|w| w[0] <= w[1]));
            assert!(r.ranked_ids.len() <= 5);
        }
    }

    #[tokio::test]
    async fn negative_threshold_fails_before_retrieval() {
        let store = ingested().await;
        let retriever = ProcessorRetriever::new(QueryProcessor::from_rag_store(&store), -1.0);
        let queries = vec![TestQuery::new("api key header", "auth", ["ats.security"])];

        let err = evaluate(&queries, &retriever, &EvalConfig::default(), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Config(_)), "got {err:?}");

        let nan = ProcessorRetriever::new(QueryProcessor::from_rag_store(&store), f32::NAN);
        assert!(matches!(nan.validate(), Err(EvalError::Config(_))));
    }
}
