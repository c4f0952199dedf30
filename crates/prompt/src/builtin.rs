//! Built-in prompt definitions.

use crate::types::{PromptPolicy, PromptDefinition};

/// Identifier of the grounded answer prompt.
pub const GROUNDED_ANSWER_ID: &str = "rag.answer.grounded";

/// Exact text the assistant must emit when the context cannot answer.
pub const DEFAULT_REFUSAL: &str = "I don't know based on the provided documents.";

/// Marker line that introduces the retrieved context in the system message.
pub const CONTEXT_MARKER: &str = "Context:";

const GROUNDED_SYSTEM_TEMPLATE: &str = r#"You are a document assistant that answers questions using only the provided context.
You will receive a set of retrieved document chunks (Context).
You must answer the user's question using ONLY the provided Context.
Rules:
1. Do NOT use your internal knowledge to answer the question.
2. If the answer is not present in the Context, you MUST respond with EXACTLY this phrase and nothing else: "{{refusal}}"
3. Do not make up or hallucinate information.
4. Keep your answer concise and directly related to the question.
Context:
{{context}}"#;

/// The grounded answer prompt: rules and context in the system message,
/// the bare question as the user message.
pub fn grounded_answer() -> PromptDefinition {
    PromptDefinition {
        id: GROUNDED_ANSWER_ID.to_string(),
        title: "Grounded answer".to_string(),
        api_version: "1.0".to_string(),
        created_by: "builtin".to_string(),
        behavior: PromptPolicy {
            refusal: None,
            strict: true,
        },
        system: GROUNDED_SYSTEM_TEMPLATE.to_string(),
        user: "{{question}}".to_string(),
    }
}

/// Look up a built-in definition by id.
pub fn builtin(id: &str) -> Option<PromptDefinition> {
    match id {
        GROUNDED_ANSWER_ID => Some(grounded_answer()),
        _ => None,
    }
}
