//! Labeled test queries: loading and input validation.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::EvalError;

/// One labeled evaluation case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestQuery {
    pub question: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Ground-truth chunk ids; must be non-empty.
    pub relevant_chunk_ids: BTreeSet<String>,
}

fn default_category() -> String {
    "uncategorized".into()
}

impl TestQuery {
    pub fn new<I, S>(question: impl Into<String>, category: impl Into<String>, relevant: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            category: category.into(),
            relevant_chunk_ids: relevant.into_iter().map(Into::into).collect(),
        }
    }

    /// # Errors
    /// [`EvalError::MalformedQuery`] for a blank question or an empty relevant set.
    pub fn validate(&self) -> Result<(), EvalError> {
        let reason = if self.question.trim().is_empty() {
            "question is empty"
        } else if self.relevant_chunk_ids.is_empty() {
            "relevant_chunk_ids is empty"
        } else if self.relevant_chunk_ids.iter().any(|id| id.trim().is_empty()) {
            "relevant_chunk_ids contains an empty id"
        } else {
            return Ok(());
        };
        Err(EvalError::MalformedQuery {
            question: self.question.clone(),
            reason: reason.into(),
        })
    }
}

/// A test query excluded before scoring, with the reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedQuery {
    pub question: String,
    pub category: String,
    pub reason: String,
}

/// Splits `queries` into scorable ones and rejected ones, preserving order.
pub fn partition_valid(queries: &[TestQuery]) -> (Vec<TestQuery>, Vec<RejectedQuery>) {
    let mut valid = Vec::with_capacity(queries.len());
    let mut rejected = Vec::new();
    for q in queries {
        match q.validate() {
            Ok(()) => valid.push(q.clone()),
            Err(e) => {
                let reason = match e {
                    EvalError::MalformedQuery { reason, .. } => reason,
                    other => other.to_string(),
                };
                warn!(question = %q.question, %reason, "rejecting test query");
                rejected.push(RejectedQuery {
                    question: q.question.clone(),
                    category: q.category.clone(),
                    reason,
                });
            }
        }
    }
    (valid, rejected)
}

/// Reads a JSON array of test queries.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<TestQuery>, EvalError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let queries: Vec<TestQuery> = serde_json::from_str(&text)?;
    info!(path = %path.display(), queries = queries.len(), "loaded test dataset");
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_relevant_set_is_rejected() {
        let qs = vec![
            TestQuery::new("How do I create a candidate?", "endpoint", ["ats.endpoint.POST./candidates"]),
            TestQuery::new("What is a widget?", "schema", Vec::<String>::new()),
            TestQuery::new("   ", "schema", ["ats.schema.Candidate"]),
        ];
        let (valid, rejected) = partition_valid(&qs);
        assert_eq!(valid.len(), 1);
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].reason, "relevant_chunk_ids is empty");
        assert_eq!(rejected[1].reason, "question is empty");
    }

    #[test]
    fn parses_dataset_json() {
        let raw = r#"[
            {"question": "q1", "category": "auth", "relevant_chunk_ids": ["ats.security", "ats.security"]},
            {"question": "q2", "relevant_chunk_ids": ["hris.schema.Employee"]}
        ]"#;
        let qs: Vec<TestQuery> = serde_json::from_str(raw).expect("valid json");
        assert_eq!(qs[0].relevant_chunk_ids.len(), 1);
        assert_eq!(qs[1].category, "uncategorized");
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(load_dataset("/no/such/dataset.json"), Err(EvalError::Io(_))));
    }
}
