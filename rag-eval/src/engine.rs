//! Runs labeled queries through a [`Retriever`] and aggregates the metrics.

use futures::stream::{self, StreamExt};
use rag_store::Progress;
use tracing::{info, warn};

use crate::config::EvalConfig;
use crate::dataset::{TestQuery, partition_valid};
use crate::error::EvalError;
use crate::metrics::score_query;
use crate::report::{AggregateReport, EvaluationRecord, FailedQuery};
use crate::retriever::{Ranking, Retriever};

/// Evaluates `queries` at every K in `cfg.k_values`.
///
/// Each query is retrieved once, at the largest K; smaller cutoffs truncate
/// that list. Queries run concurrently up to `cfg.concurrency`, each bounded by
/// `cfg.timeout`. Malformed queries are rejected up front; failed or timed-out
/// retrievals are recorded and left out of the means.
///
/// # Errors
/// [`EvalError::Config`] for invalid knobs, a misconfigured retriever or an
/// empty query list, before any retrieval happens.
pub async fn evaluate(
    queries: &[TestQuery],
    retriever: &dyn Retriever,
    cfg: &EvalConfig,
    progress: &dyn Progress,
) -> Result<AggregateReport, EvalError> {
    cfg.validate()?;
    retriever.validate()?;
    let k_values = cfg.sorted_k_values()?;
    let max_k = k_values.iter().copied().max().unwrap_or(1);
    if queries.is_empty() {
        return Err(EvalError::Config("no test queries supplied".into()));
    }

    let (valid, rejected) = partition_valid(queries);
    info!(
        queries = queries.len(),
        valid = valid.len(),
        rejected = rejected.len(),
        max_k,
        concurrency = cfg.concurrency,
        "starting evaluation"
    );
    progress.set_total(valid.len() as u64);

    let mut outcomes: Vec<(usize, Result<Ranking, EvalError>)> = stream::iter(valid.iter().enumerate())
        .map(|(i, q)| async move {
            let res = match tokio::time::timeout(cfg.timeout, retriever.retrieve(&q.question, max_k)).await {
                Ok(r) => r,
                Err(_) => Err(EvalError::Timeout(cfg.timeout)),
            };
            progress.step(&q.category);
            (i, res)
        })
        .buffer_unordered(cfg.concurrency)
        .collect()
        .await;
    outcomes.sort_by_key(|(i, _)| *i);

    let mut records = Vec::with_capacity(valid.len());
    let mut failed = Vec::new();
    for (i, res) in outcomes {
        let q = &valid[i];
        match res {
            Ok(ranking) => {
                let metrics = score_query(&ranking.ids, &q.relevant_chunk_ids, &k_values);
                records.push(EvaluationRecord {
                    question: q.question.clone(),
                    category: q.category.clone(),
                    relevant_chunk_ids: q.relevant_chunk_ids.clone(),
                    ranked_ids: ranking.ids,
                    scores: ranking.scores,
                    metrics,
                });
            }
            Err(e) => {
                warn!(question = %q.question, error = %e, "query failed");
                failed.push(FailedQuery {
                    question: q.question.clone(),
                    category: q.category.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let report = AggregateReport::build(&k_values, records, failed, rejected);
    progress.finish(&format!("{} queries evaluated", report.evaluated));
    info!(
        evaluated = report.evaluated,
        failed = report.failed.len(),
        rejected = report.rejected.len(),
        no_hit = report.no_hit_count,
        "evaluation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::FnRetriever;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use rag_store::NoopProgress;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn queries() -> Vec<TestQuery> {
        vec![
            TestQuery::new("How do I create a candidate?", "endpoint", ["ats.endpoint.POST./candidates"]),
            TestQuery::new("unknown", "schema", ["ats.schema.Candidate"]),
            TestQuery::new("broken", "auth", ["ats.security"]),
            TestQuery::new("slow", "auth", ["ats.security"]),
            TestQuery::new("no labels", "auth", Vec::<String>::new()),
        ]
    }

    type Reply = BoxFuture<'static, Result<Ranking, String>>;

    fn fake(calls: Arc<AtomicUsize>) -> FnRetriever<impl Fn(String, usize) -> Reply + Send + Sync> {
        FnRetriever(move |q: String, k: usize| -> Reply {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                assert_eq!(k, 5, "retrieval always runs at the largest K");
                match q.as_str() {
                    "How do I create a candidate?" => Ok(Ranking::from_ids([
                        "ats.endpoint.POST./candidates",
                        "ats.schema.Candidate",
                        "hris.endpoint.GET./employees",
                    ])),
                    "broken" => Err("store unavailable".to_string()),
                    "slow" => {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        Ok(Ranking::default())
                    }
                    _ => Ok(Ranking::default()),
                }
            }
            .boxed()
        })
    }

    fn cfg() -> EvalConfig {
        EvalConfig {
            k_values: vec![3, 1, 5],
            concurrency: 3,
            timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn failures_are_recorded_not_fatal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let r = evaluate(&queries(), &fake(calls.clone()), &cfg(), &NoopProgress)
            .await
            .expect("report");

        assert_eq!(calls.load(Ordering::SeqCst), 4, "one retrieval per valid query");
        assert_eq!(r.k_values, vec![1, 3, 5]);
        assert_eq!(r.evaluated, 2);
        assert_eq!(r.failed.len(), 2);
        assert_eq!(r.rejected.len(), 1);
        assert_eq!(r.rejected[0].question, "no labels");
        assert!(r.failed.iter().any(|f| f.question == "slow" && f.reason.contains("timed out")));
        assert!((r.error_rate - 0.5).abs() < 1e-9);

        let first = &r.records[0];
        assert_eq!(first.question, "How do I create a candidate?");
        let at3 = first.metrics.at(3).expect("k=3");
        assert!((at3.precision - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(at3.recall, 1.0);
        assert_eq!(first.metrics.mrr, 1.0);

        // Empty ranking: all zeros, counted as no-hit, not an error.
        let empty = &r.records[1];
        assert!(empty.metrics.at_k.iter().all(|m| m.precision == 0.0 && m.hit_rate == 0.0));
        assert_eq!(r.no_hit_count, 1);
        assert_eq!(r.empty_result_count, 1);

        assert!(!r.per_category.contains_key("auth"));
        let overall = r.overall.expect("two successful queries");
        assert_eq!(overall.mrr, 0.5);
    }

    #[tokio::test]
    async fn invalid_k_fails_before_any_retrieval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bad = cfg().with_k_values(vec![0, 3]);
        let err = evaluate(&queries(), &fake(calls.clone()), &bad, &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));

        let err = evaluate(&queries(), &fake(calls.clone()), &cfg().with_k_values(vec![]), &NoopProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_dataset_is_a_config_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = evaluate(&[], &fake(calls), &cfg(), &NoopProgress).await.unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }
}
