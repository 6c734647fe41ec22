//! Query processing and answer generation over ingested specification chunks.
//!
//! - [`QueryProcessor::retrieve`] embeds a question, queries the vector store
//!   and keeps hits within a distance threshold (ascending distance)
//! - [`QueryProcessor::retrieve_in_conversation`] first rewrites follow-up
//!   questions into a standalone form
//! - [`answer`] feeds the retrieved context to a chat model

mod api_types;
mod cfg;
mod error;
mod prompt;
mod retrieve;

pub use api_types::{ChatMessage, QaAnswer, RetrievalResult, Role};
pub use cfg::{DEFAULT_DISTANCE_THRESHOLD, DEFAULT_TOP_K, RetrievalConfig, validate_query_params};
pub use error::ContextorError;
pub use prompt::{NO_CONTEXT, NOT_FOUND_ANSWER};
pub use retrieve::{QueryProcessor, filter_hits};

use ai_llm_service::CompletionProvider;
use tracing::{debug, info};

/// Answers `question` with retrieval-augmented context.
///
/// Retrieval uses `history` for query rewriting; the answer prompt carries the
/// retrieved chunk texts, or a "no documentation" marker when nothing passed
/// the threshold. The returned history is `history` plus this exchange.
///
/// # Errors
/// Config, retrieval or completion failures.
pub async fn answer(
    processor: &QueryProcessor,
    chat: &dyn CompletionProvider,
    question: &str,
    history: &[ChatMessage],
    cfg: &RetrievalConfig,
) -> Result<QaAnswer, ContextorError> {
    let retrieval = processor
        .retrieve_in_conversation(question, history, cfg.top_k, cfg.distance_threshold)
        .await?;
    let contexts = retrieval.contexts();
    debug!(contexts = contexts.len(), "building answer prompt");

    let system = prompt::answer_system(&contexts);
    let user = prompt::answer_prompt(history, question);
    let text = chat.complete(&user, Some(&system)).await?;
    let text = text.trim().to_string();
    info!(chars = text.len(), contexts = contexts.len(), "answer generated");

    let mut updated = history.to_vec();
    updated.push(ChatMessage::user(question));
    updated.push(ChatMessage::assistant(text.clone()));

    Ok(QaAnswer {
        answer: text,
        contexts,
        history: updated,
        retrieval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::tests::{Scripted, processor};

    #[tokio::test]
    async fn answer_appends_exchange_to_history() {
        let p = processor().await;
        let chat = Scripted::new(vec![Ok("  Use POST /candidates. ")]);
        let qa = answer(&p, &chat, "How do I create a candidate?", &[], &RetrievalConfig::default())
            .await
            .expect("answer");

        assert_eq!(qa.answer, "Use POST /candidates.");
        assert_eq!(qa.history.len(), 2);
        assert_eq!(qa.history[1], ChatMessage::assistant("Use POST /candidates."));
        assert_eq!(qa.contexts[0], "POST /candidates create a candidate");
    }

    #[tokio::test]
    async fn chat_failure_is_an_llm_error() {
        let p = processor().await;
        let chat = Scripted::new(vec![Err(())]);
        let cfg = RetrievalConfig {
            top_k: 2,
            distance_threshold: 0.0,
        };
        let err = answer(&p, &chat, "anything", &[], &cfg).await.unwrap_err();
        assert!(matches!(err, ContextorError::Llm(_)));
        assert!(err.is_transient());
    }
}
