//! LLM provider factory.
//!
//! Resolves a provider name to a concrete client and wraps it with the
//! retry boundary.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::retry::{RetryPolicy, RetryingClient};
use crate::types::ProviderType;
use grounded_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai", "groq")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by hosted providers
/// * `retry` - Backoff schedule for transient failures
///
/// # Errors
/// `FatalConfig` if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    retry: RetryPolicy,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider).ok_or_else(|| {
        AppError::FatalConfig(format!(
            "Unknown provider: {}. Supported: ollama, openai, groq",
            provider
        ))
    })?;

    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    let client: Arc<dyn LlmClient> = match provider_type {
        ProviderType::Ollama => Arc::new(OllamaClient::with_base_url(base_url)?),
        ProviderType::OpenAI | ProviderType::Groq => {
            let api_key = api_key.ok_or_else(|| {
                AppError::FatalConfig(format!("{} provider requires an API key", provider))
            })?;
            Arc::new(OpenAiClient::new(provider_type.as_str(), base_url, api_key)?)
        }
    };

    tracing::debug!(
        provider = provider_type.as_str(),
        base_url,
        max_attempts = retry.max_attempts,
        "Created LLM client"
    );

    Ok(Arc::new(RetryingClient::new(client, retry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, RetryPolicy::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client(
            "ollama",
            Some("http://localhost:8080"),
            None,
            RetryPolicy::none(),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_groq_requires_api_key() {
        match create_client("groq", None, None, RetryPolicy::default()) {
            Err(AppError::FatalConfig(msg)) => assert!(msg.contains("requires an API key")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_create_groq_client() {
        let client = create_client("groq", None, Some("gsk-test"), RetryPolicy::default()).unwrap();
        assert_eq!(client.provider_name(), "groq");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, RetryPolicy::default()) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
