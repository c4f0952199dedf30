//! Grounded answer generation.

use crate::chunk::Chunk;
use crate::rag::types::Answer;
use crate::trace::{PromptTrace, TraceSink};
use grounded_core::AppResult;
use grounded_llm::{LlmClient, LlmRequest};
use grounded_prompt::{build_grounded_prompt, PromptDefinition};
use std::sync::Arc;
use tracing::instrument;

/// Separator between chunk texts in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Join chunk texts in rank order.
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Generation settings for the composer.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub refusal: String,
}

/// Turns a question plus retrieved chunks into a grounded answer.
///
/// The prompt is always sent, even with no chunks: the backend sees an
/// empty context and is instructed to refuse.
pub struct AnswerComposer {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    settings: ComposerSettings,
    sink: Arc<dyn TraceSink>,
}

impl AnswerComposer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: ComposerSettings,
        sink: Arc<dyn TraceSink>,
    ) -> Self {
        Self {
            client,
            prompt,
            settings,
            sink,
        }
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// The refusal text in effect, honoring a prompt-level override.
    pub fn refusal(&self) -> &str {
        self.prompt
            .behavior
            .refusal
            .as_deref()
            .unwrap_or(&self.settings.refusal)
    }

    #[instrument(skip(self, chunks), fields(chunks = chunks.len(), model = %self.settings.model))]
    pub async fn compose(&self, query: &str, chunks: Vec<Chunk>) -> AppResult<Answer> {
        let context = build_context(&chunks);
        let built = build_grounded_prompt(&self.prompt, query, &context, &self.settings.refusal)?;

        let mut request = LlmRequest::new(built.user.clone(), self.settings.model.clone())
            .with_system(built.system.clone())
            .with_temperature(self.settings.temperature);
        if let Some(max_tokens) = self.settings.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.client.complete(&request).await?;
        let answer = response.text().trim().to_string();

        let raw_response =
            serde_json::to_string(&response.content).unwrap_or_else(|_| answer.clone());
        self.sink.record(&PromptTrace::new(
            query,
            built.system,
            built.user,
            raw_response,
            response.model.clone(),
        ));

        let refused = answer == self.refusal();
        tracing::info!(
            provider = self.client.provider_name(),
            refused,
            tokens = response.usage.total_tokens,
            "Generated answer"
        );

        Ok(Answer {
            answer,
            source_documents: chunks,
            query: query.to_string(),
        })
    }
}
