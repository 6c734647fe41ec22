//! Prompt builders for query rewriting and answer generation.

use crate::api_types::ChatMessage;

/// Context placeholder used when retrieval returned nothing.
pub const NO_CONTEXT: &str = "No relevant documentation found.";

/// Answer the model is told to give when the context has nothing useful.
pub const NOT_FOUND_ANSWER: &str = "I couldn't find that in the documentation.";

/// `role: content` turns separated by blank lines.
pub fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt asking for a standalone, pronoun-free version of `question`.
pub fn rewrite_prompt(history: &[ChatMessage], question: &str) -> String {
    format!(
        "You are a *rewrite engine*, not a conversational assistant.\n\n\
         INPUT\n=====\nConversation History\n--------------------\n\
         {history}\n\n\
         TASK\n====\n\
         Rewrite the **Latest User Message** so that it can be understood entirely on its own.\n\
         1. Replace every pronoun **and every vague noun phrase** with a fully explicit description drawn from the conversation.\n\
         2. Do **not** add explanations, salutations, quotation marks, or mention the rewrite process.\n\
         3. Output **only** the rewritten sentence or question, nothing else.\n\n\
         Original question:\n{question}\n\n\
         Rewritten version (clear, specific, technical, matching API terminology):",
        history = render_history(history),
        question = question.trim(),
    )
}

/// System message carrying the retrieved context.
pub fn answer_system(contexts: &[String]) -> String {
    let context = if contexts.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        contexts.join("\n\n")
    };
    format!(
        "You are a highly knowledgeable API assistant.\n\
         Use the following API documentation context to answer the question precisely.\n\
         If it is unclear which service the user means, ask them to clarify.\n\
         Answer clearly, with direct reference to the relevant API endpoints.\n\n\
         ---\nContext:\n{context}\n---\n\n\
         If you don't find the answer, say: \"{NOT_FOUND_ANSWER}\""
    )
}

/// User prompt: prior turns (if any) followed by the question.
pub fn answer_prompt(history: &[ChatMessage], question: &str) -> String {
    if history.is_empty() {
        return question.trim().to_string();
    }
    format!(
        "Conversation so far:\n{}\n\nuser: {}",
        render_history(history),
        question.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_prompt_carries_history_and_question() {
        let h = vec![
            ChatMessage::user("How do I list candidates?"),
            ChatMessage::assistant("Use GET /candidates."),
        ];
        let p = rewrite_prompt(&h, "  Can I filter it by status? ");
        assert!(p.contains("user: How do I list candidates?\n\nassistant: Use GET /candidates."));
        assert!(p.contains("Original question:\nCan I filter it by status?\n"));
    }

    #[test]
    fn empty_context_is_spelled_out() {
        assert!(answer_system(&[]).contains(NO_CONTEXT));
        let s = answer_system(&["a".into(), "b".into()]);
        assert!(s.contains("Context:\na\n\nb\n---"));
        assert_eq!(answer_prompt(&[], " hi "), "hi");
    }
}
