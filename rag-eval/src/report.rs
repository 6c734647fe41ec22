//! Per-query records and their aggregation into a serializable report.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dataset::RejectedQuery;
use crate::error::EvalError;
use crate::metrics::{MetricsAtK, QueryMetrics};

/// Scored outcome of one successful query.
#[derive(Clone, Debug, Serialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub category: String,
    pub relevant_chunk_ids: BTreeSet<String>,
    /// As returned by retrieval at the largest K.
    pub ranked_ids: Vec<String>,
    pub scores: Vec<f32>,
    pub metrics: QueryMetrics,
}

impl EvaluationRecord {
    /// No relevant id anywhere in the ranked list.
    pub fn is_no_hit(&self) -> bool {
        self.metrics.mrr == 0.0
    }
}

/// A query whose retrieval failed or timed out; excluded from every mean.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedQuery {
    pub question: String,
    pub category: String,
    pub reason: String,
}

/// Mean metrics over a group of records.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricSummary {
    pub queries: usize,
    pub mrr: f64,
    /// Ascending K.
    pub at_k: Vec<MetricsAtK>,
}

impl MetricSummary {
    /// `None` for an empty group.
    pub fn mean_of(records: &[&EvaluationRecord], k_values: &[usize]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let n = records.len() as f64;
        let at_k = k_values
            .iter()
            .map(|&k| {
                let mut acc = MetricsAtK {
                    k,
                    ..MetricsAtK::default()
                };
                for m in records.iter().filter_map(|r| r.metrics.at(k)) {
                    acc.precision += m.precision;
                    acc.recall += m.recall;
                    acc.f1 += m.f1;
                    acc.ndcg += m.ndcg;
                    acc.hit_rate += m.hit_rate;
                }
                acc.precision /= n;
                acc.recall /= n;
                acc.f1 /= n;
                acc.ndcg /= n;
                acc.hit_rate /= n;
                acc
            })
            .collect();
        Some(Self {
            queries: records.len(),
            mrr: records.iter().map(|r| r.metrics.mrr).sum::<f64>() / n,
            at_k,
        })
    }

    pub fn at(&self, k: usize) -> Option<&MetricsAtK> {
        self.at_k.iter().find(|m| m.k == k)
    }
}

/// Everything one evaluation run produced.
#[derive(Clone, Debug, Serialize)]
pub struct AggregateReport {
    pub generated_at: DateTime<Utc>,
    pub k_values: Vec<usize>,
    /// Queries supplied, including rejected ones.
    pub total_queries: usize,
    pub evaluated: usize,
    /// Means over all successful queries; `None` if there were none.
    pub overall: Option<MetricSummary>,
    /// Only categories with at least one successful query.
    pub per_category: BTreeMap<String, MetricSummary>,
    pub records: Vec<EvaluationRecord>,
    pub failed: Vec<FailedQuery>,
    pub rejected: Vec<RejectedQuery>,
    /// `failed / (evaluated + failed)`.
    pub error_rate: f64,
    /// Successful queries with no relevant id in the ranked list.
    pub no_hit_count: usize,
    /// Successful queries whose ranked list was empty.
    pub empty_result_count: usize,
    pub total_relevant_ids: usize,
    pub total_retrieved_ids: usize,
}

impl AggregateReport {
    pub fn build(
        k_values: &[usize],
        records: Vec<EvaluationRecord>,
        failed: Vec<FailedQuery>,
        rejected: Vec<RejectedQuery>,
    ) -> Self {
        let all: Vec<&EvaluationRecord> = records.iter().collect();
        let overall = MetricSummary::mean_of(&all, k_values);

        let mut groups: BTreeMap<&str, Vec<&EvaluationRecord>> = BTreeMap::new();
        for r in &records {
            groups.entry(r.category.as_str()).or_default().push(r);
        }
        let per_category = groups
            .into_iter()
            .filter_map(|(cat, rs)| MetricSummary::mean_of(&rs, k_values).map(|s| (cat.to_string(), s)))
            .collect();

        let attempted = records.len() + failed.len();
        let error_rate = if attempted == 0 {
            0.0
        } else {
            failed.len() as f64 / attempted as f64
        };

        Self {
            generated_at: Utc::now(),
            k_values: k_values.to_vec(),
            total_queries: attempted + rejected.len(),
            evaluated: records.len(),
            overall,
            per_category,
            no_hit_count: records.iter().filter(|r| r.is_no_hit()).count(),
            empty_result_count: records.iter().filter(|r| r.ranked_ids.is_empty()).count(),
            total_relevant_ids: records.iter().map(|r| r.relevant_chunk_ids.len()).sum(),
            total_retrieved_ids: records.iter().map(|r| r.ranked_ids.len()).sum(),
            records,
            failed,
            rejected,
            error_rate,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, EvalError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EvalError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}
