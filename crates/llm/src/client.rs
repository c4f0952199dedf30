//! LLM client abstraction and request/response types.

use grounded_core::AppResult;
use serde::{Deserialize, Serialize};

/// LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The user message sent to the LLM
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2", "llama-3.3-70b-versatile")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// System message carrying instructions and context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            system: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// One element of a structured response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part kind, e.g. "text", "image", "tool_use"
    #[serde(rename = "type")]
    pub kind: String,

    /// Text payload, absent for non-text parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// Raw content returned by a generation backend.
///
/// Backends answer either with a plain string or with a list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseContent {
    PlainText(String),
    StructuredParts(Vec<ContentPart>),
}

impl ResponseContent {
    /// Normalize to a single string. Only parts of kind `text` contribute,
    /// concatenated in order without separators.
    pub fn to_text(&self) -> String {
        match self {
            ResponseContent::PlainText(text) => text.clone(),
            ResponseContent::StructuredParts(parts) => parts
                .iter()
                .filter(|part| part.kind == "text")
                .filter_map(|part| part.text.as_deref())
                .collect(),
        }
    }
}

impl From<String> for ResponseContent {
    fn from(text: String) -> Self {
        ResponseContent::PlainText(text)
    }
}

impl From<&str> for ResponseContent {
    fn from(text: &str) -> Self {
        ResponseContent::PlainText(text.to_string())
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated content, as returned by the backend
    pub content: ResponseContent,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    #[serde(default)]
    pub usage: LlmUsage,
}

impl LlmResponse {
    /// Normalized answer text.
    pub fn text(&self) -> String {
        self.content.to_text()
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for generation backends.
///
/// Implementations map HTTP and transport failures onto the shared error
/// taxonomy: authentication problems are `FatalConfig`, rate limits, 5xx and
/// network failures are `BackendTransient`.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Perform a single non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_normalization() {
        let content = ResponseContent::from("Paris is the capital.");
        assert_eq!(content.to_text(), "Paris is the capital.");
    }

    #[test]
    fn test_structured_parts_keep_only_text() {
        let content: ResponseContent = serde_json::from_str(
            r#"[
                {"type": "text", "text": "Chunk overlap improves "},
                {"type": "image", "url": "ignored.png"},
                {"type": "text", "text": "context continuity."}
            ]"#,
        )
        .unwrap();

        assert!(matches!(content, ResponseContent::StructuredParts(_)));
        assert_eq!(content.to_text(), "Chunk overlap improves context continuity.");
    }

    #[test]
    fn test_plain_string_deserializes_as_plain_text() {
        let content: ResponseContent = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(content, ResponseContent::PlainText("hello".to_string()));
    }

    #[test]
    fn test_empty_parts() {
        let content = ResponseContent::StructuredParts(vec![]);
        assert_eq!(content.to_text(), "");
    }

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("What is RAG?", "llama3.2")
            .with_system("Answer from context")
            .with_temperature(0.0)
            .with_max_tokens(256);

        assert_eq!(request.system.as_deref(), Some("Answer from context"));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(256));
    }
}
