//! The retrieval seam the engine drives: a query processor or any async function.

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;

use contextor::{QueryProcessor, RetrievalResult};
use serde::Serialize;

use crate::error::EvalError;

/// Ranked chunk ids with their distances (may be empty when unknown).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub ids: Vec<String>,
    pub scores: Vec<f32>,
}

impl Ranking {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            scores: Vec::new(),
        }
    }
}

impl From<RetrievalResult> for Ranking {
    fn from(r: RetrievalResult) -> Self {
        Self {
            ids: r.ranked_ids(),
            scores: r.scores(),
        }
    }
}

pub type RetrieveFuture<'a> = Pin<Box<dyn Future<Output = Result<Ranking, EvalError>> + Send + 'a>>;

/// Returns up to `k` chunk ids for `question`, most relevant first.
pub trait Retriever: Send + Sync {
    fn retrieve<'a>(&'a self, question: &'a str, k: usize) -> RetrieveFuture<'a>;

    /// Checks the retriever's own settings before any query runs.
    fn validate(&self) -> Result<(), EvalError> {
        Ok(())
    }
}

/// Drives a [`QueryProcessor`] with a fixed distance threshold.
#[derive(Clone)]
pub struct ProcessorRetriever {
    processor: QueryProcessor,
    distance_threshold: f32,
}

impl ProcessorRetriever {
    pub fn new(processor: QueryProcessor, distance_threshold: f32) -> Self {
        Self {
            processor,
            distance_threshold,
        }
    }
}

impl Retriever for ProcessorRetriever {
    fn retrieve<'a>(&'a self, question: &'a str, k: usize) -> RetrieveFuture<'a> {
        Box::pin(async move {
            self.processor
                .retrieve(question, k, self.distance_threshold)
                .await
                .map(Ranking::from)
                .map_err(|e| EvalError::Retrieval(e.to_string()))
        })
    }

    fn validate(&self) -> Result<(), EvalError> {
        contextor::validate_query_params(1, self.distance_threshold)
            .map_err(|e| EvalError::Config(e.to_string()))
    }
}

/// Adapts an async function `(question, k) -> Result<Ranking, E>`.
pub struct FnRetriever<F>(pub F);

impl<F, Fut, E> Retriever for FnRetriever<F>
where
    F: Fn(String, usize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Ranking, E>> + Send + 'static,
    E: Display,
{
    fn retrieve<'a>(&'a self, question: &'a str, k: usize) -> RetrieveFuture<'a> {
        let fut = (self.0)(question.to_string(), k);
        Box::pin(async move { fut.await.map_err(|e| EvalError::Retrieval(e.to_string())) })
    }
}
