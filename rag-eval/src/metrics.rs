//! Ranking metrics for one query at several cutoffs.
//!
//! Every cutoff is computed from a single ranked list by truncation. Ranks are
//! positions in the list as returned; a repeated id earns relevance only at its
//! first position.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

/// Metrics of one query at one cutoff K.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MetricsAtK {
    pub k: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub ndcg: f64,
    pub hit_rate: f64,
}

/// Metrics of one query across all cutoffs, plus its reciprocal rank.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryMetrics {
    /// Ascending K.
    pub at_k: Vec<MetricsAtK>,
    /// `1 / rank` of the first relevant id in the full list, 0 if none.
    pub mrr: f64,
}

impl QueryMetrics {
    pub fn at(&self, k: usize) -> Option<&MetricsAtK> {
        self.at_k.iter().find(|m| m.k == k)
    }
}

/// Relevance flag per position; later repeats of an id are never relevant.
pub fn relevance_flags(ranked: &[String], relevant: &BTreeSet<String>) -> Vec<bool> {
    let mut seen = HashSet::with_capacity(ranked.len());
    ranked
        .iter()
        .map(|id| seen.insert(id.as_str()) && relevant.contains(id))
        .collect()
}

/// Scores `ranked` against `relevant` at each of `k_values`.
///
/// `relevant` must be non-empty (validated upstream); with an empty set every
/// metric is 0.
pub fn score_query(ranked: &[String], relevant: &BTreeSet<String>, k_values: &[usize]) -> QueryMetrics {
    let rel = relevance_flags(ranked, relevant);

    let at_k = k_values
        .iter()
        .map(|&k| metrics_at_k(&rel, relevant.len(), k))
        .collect();
    QueryMetrics {
        at_k,
        mrr: reciprocal_rank(&rel),
    }
}

fn metrics_at_k(rel: &[bool], relevant_total: usize, k: usize) -> MetricsAtK {
    let cut = k.min(rel.len());
    let top = &rel[..cut];
    let hits = top.iter().filter(|r| **r).count();

    let precision = if cut == 0 { 0.0 } else { hits as f64 / cut as f64 };
    let recall = if relevant_total == 0 {
        0.0
    } else {
        hits as f64 / relevant_total as f64
    };
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    MetricsAtK {
        k,
        precision,
        recall,
        f1,
        ndcg: ndcg(top, relevant_total, k),
        hit_rate: if hits > 0 { 1.0 } else { 0.0 },
    }
}

fn discount(i: usize) -> f64 {
    1.0 / ((i + 2) as f64).log2()
}

fn ndcg(top: &[bool], relevant_total: usize, k: usize) -> f64 {
    let dcg: f64 = top
        .iter()
        .enumerate()
        .filter(|(_, r)| **r)
        .map(|(i, _)| discount(i))
        .sum();
    let idcg: f64 = (0..k.min(relevant_total)).map(discount).sum();
    if idcg == 0.0 { 0.0 } else { dcg / idcg }
}

fn reciprocal_rank(rel: &[bool]) -> f64 {
    rel.iter()
        .position(|r| *r)
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn set(xs: &[&str]) -> BTreeSet<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn create_candidate_scenario() {
        let ranked = ids(&[
            "ats.endpoint.POST./candidates",
            "ats.schema.Candidate",
            "hris.endpoint.GET./employees",
        ]);
        let m = score_query(&ranked, &set(&["ats.endpoint.POST./candidates"]), &[1, 3, 5]);
        let at3 = m.at(3).expect("k=3");
        assert!(close(at3.precision, 1.0 / 3.0));
        assert!(close(at3.recall, 1.0));
        assert!(close(at3.hit_rate, 1.0));
        assert!(close(at3.ndcg, 1.0));
        assert!(close(m.mrr, 1.0));
        // K beyond the list: denominator is the list length.
        assert!(close(m.at(5).expect("k=5").precision, 1.0 / 3.0));
        assert!(close(m.at(1).expect("k=1").f1, 1.0));
    }

    #[test]
    fn empty_ranking_scores_zero_everywhere() {
        let m = score_query(&[], &set(&["ats.endpoint.POST./candidates"]), &[1, 3, 5, 10]);
        assert_eq!(m.mrr, 0.0);
        for at in &m.at_k {
            assert_eq!(*at, MetricsAtK { k: at.k, ..MetricsAtK::default() });
        }
    }

    #[test]
    fn mrr_uses_first_relevant_rank() {
        let m = score_query(&ids(&["x", "y", "a", "b"]), &set(&["a", "b"]), &[2]);
        assert!(close(m.mrr, 1.0 / 3.0));
        assert_eq!(m.at(2).expect("k=2").hit_rate, 0.0);
    }

    #[test]
    fn ndcg_against_ideal_ordering() {
        // relevant at positions 1 and 3 (0-indexed), |G| = 2, K = 4
        let m = score_query(&ids(&["x", "a", "y", "b"]), &set(&["a", "b"]), &[4]);
        let dcg = 1.0 / 3f64.log2() + 1.0 / 5f64.log2();
        let idcg = 1.0 + 1.0 / 3f64.log2();
        assert!(close(m.at(4).expect("k=4").ndcg, dcg / idcg));
    }

    #[test]
    fn duplicates_are_scored_once() {
        let m = score_query(&ids(&["a", "a", "x"]), &set(&["a"]), &[2, 3]);
        let at2 = m.at(2).expect("k=2");
        assert!(close(at2.precision, 0.5));
        assert!(close(at2.recall, 1.0));
        assert!(close(at2.ndcg, 1.0));
        assert!(close(m.at(3).expect("k=3").precision, 1.0 / 3.0));
    }

    #[test]
    fn repeated_ids_keep_their_positions() {
        let m = score_query(&ids(&["x", "x", "a"]), &set(&["a"]), &[3]);
        let at3 = m.at(3).expect("k=3");
        assert!(close(m.mrr, 1.0 / 3.0));
        assert!(close(at3.precision, 1.0 / 3.0));
        assert!(close(at3.ndcg, 0.5));
        assert!(close(at3.recall, 1.0));
    }

    #[test]
    fn recall_is_monotonic_and_hit_iff_precision() {
        let ranked = ids(&["x", "a", "y", "b", "c"]);
        let g = set(&["a", "b", "z"]);
        let m = score_query(&ranked, &g, &[1, 2, 3, 4, 5]);
        assert!(m.at_k.windows(2).all(|w| w[0].recall <= w[1].recall));
        for at in &m.at_k {
            assert_eq!(at.hit_rate == 1.0, at.precision > 0.0);
        }
    }
}
