//! Ollama generation backend, via the chat endpoint.
//!
//! API reference: https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion

use super::{map_http_error, map_transport_error};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// First request after a model load can take a while.
const TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    options: SamplingOptions,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    model: String,
    message: ReplyMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

pub struct OllamaClient {
    chat_url: String,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new() -> AppResult<Self> {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| AppError::FatalConfig(format!("Cannot build HTTP client: {}", e)))?;

        let base = base_url.into();
        Ok(Self {
            chat_url: format!("{}/api/chat", base.trim_end_matches('/')),
            http,
        })
    }

    fn chat_body<'a>(request: &'a LlmRequest) -> ChatBody<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(Message {
                role: "system",
                content: system,
            });
        }
        messages.push(Message {
            role: "user",
            content: &request.prompt,
        });

        ChatBody {
            model: &request.model,
            messages,
            options: SamplingOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens,
            },
            stream: false,
        }
    }
}

impl From<ChatReply> for LlmResponse {
    fn from(reply: ChatReply) -> Self {
        LlmResponse {
            content: reply.message.content.into(),
            model: reply.model,
            usage: LlmUsage::new(reply.prompt_eval_count, reply.eval_count),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    #[tracing::instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let response = self
            .http
            .post(&self.chat_url)
            .json(&Self::chat_body(request))
            .send()
            .await
            .map_err(|e| map_transport_error("Ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(map_http_error("Ollama", status, &detail));
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Unexpected Ollama chat payload: {}", e)))?;

        tracing::debug!(
            prompt_tokens = reply.prompt_eval_count,
            completion_tokens = reply.eval_count,
            "Ollama replied"
        );
        Ok(reply.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url() {
        assert_eq!(
            OllamaClient::new().unwrap().chat_url,
            "http://localhost:11434/api/chat"
        );
        assert_eq!(
            OllamaClient::with_base_url("http://gpu-box:11434/").unwrap().chat_url,
            "http://gpu-box:11434/api/chat"
        );
    }

    #[test]
    fn test_system_and_user_become_separate_messages() {
        let request = LlmRequest::new("What is RAG?", "llama3.2")
            .with_system("Use only the context")
            .with_temperature(0.0)
            .with_max_tokens(100);

        let body = serde_json::to_value(OllamaClient::chat_body(&request)).unwrap();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Use only the context");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "What is RAG?");
        assert_eq!(body["options"]["num_predict"], 100);
        assert_eq!(body["stream"], false);
        assert!(body["options"].get("top_p").is_none());
    }

    #[test]
    fn test_no_system_message_when_absent() {
        let request = LlmRequest::new("hi", "llama3.2");
        let body = OllamaClient::chat_body(&request);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[test]
    fn test_reply_conversion() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Grounded."},"done":true,"prompt_eval_count":12,"eval_count":3}"#,
        )
        .unwrap();

        let response = LlmResponse::from(reply);
        assert_eq!(response.text(), "Grounded.");
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        // Nothing listens on the discard port
        let client = OllamaClient::with_base_url("http://127.0.0.1:9").unwrap();
        let err = client
            .complete(&LlmRequest::new("hi", "llama3.2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendTransient(_)));
    }
}
