//! Embeddings from a local Ollama server.
//!
//! One `/api/embeddings` request per text. Construction sends a probe
//! request: a server that cannot be reached or a model that is not pulled
//! becomes `FatalConfig`, and a model with the wrong output size becomes
//! `DimensionMismatch`.
//!
//! ```no_run
//! use grounded_knowledge::embeddings::providers::OllamaProvider;
//! use grounded_knowledge::embeddings::{EmbeddingConfig, EmbeddingProvider};
//!
//! # async fn example() -> grounded_core::AppResult<()> {
//! let provider = OllamaProvider::new(EmbeddingConfig {
//!     provider: "ollama".to_string(),
//!     model: "nomic-embed-text".to_string(),
//!     dimensions: 768,
//!     ..Default::default()
//! })
//! .await?;
//! let vector = provider.embed("chunk overlap").await?;
//! # Ok(())
//! # }
//! ```

use crate::embeddings::provider::check_dimensions;
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use grounded_core::{AppError, AppResult};
use grounded_llm::providers::{map_http_error, map_transport_error};
use grounded_llm::RetryPolicy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const LOCAL_OLLAMA: &str = "http://localhost:11434";
const EMBED_PATH: &str = "/api/embeddings";
const TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TEXT: &str = "grounded embedding probe";

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    http: Client,
    url: String,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OllamaError {
    error: String,
}

/// Config endpoint, then `OLLAMA_URL`, then localhost.
fn base_url(configured: Option<&str>) -> String {
    let raw = match configured {
        Some(url) => url.to_string(),
        None => std::env::var("OLLAMA_URL").unwrap_or_else(|_| LOCAL_OLLAMA.to_string()),
    };
    raw.trim_end_matches('/').to_string()
}

impl OllamaProvider {
    pub async fn new(config: EmbeddingConfig) -> AppResult<Self> {
        Self::with_retry(config, RetryPolicy::default()).await
    }

    pub async fn with_retry(config: EmbeddingConfig, retry: RetryPolicy) -> AppResult<Self> {
        let http = Client::builder().timeout(TIMEOUT).build().map_err(|e| {
            AppError::FatalConfig(format!("Cannot build HTTP client for Ollama: {}", e))
        })?;

        let provider = Self {
            http,
            url: format!("{}{}", base_url(config.endpoint.as_deref()), EMBED_PATH),
            model: config.model,
            dimensions: config.dimensions,
            retry,
        };
        provider.probe().await?;
        Ok(provider)
    }

    /// Full embeddings URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self), fields(model = %self.model, url = %self.url))]
    async fn probe(&self) -> AppResult<()> {
        match self.embed_retrying(PROBE_TEXT).await {
            Ok(_) => {
                debug!("Ollama embedding model is ready");
                Ok(())
            }
            Err(mismatch @ AppError::DimensionMismatch { .. }) => Err(mismatch),
            Err(e) => {
                warn!("Ollama probe failed: {}", e);
                Err(AppError::FatalConfig(format!(
                    "Ollama embeddings unavailable at {} ({}). Is the server running? Try: ollama pull {}",
                    self.url, e, self.model
                )))
            }
        }
    }

    async fn embed_retrying(&self, text: &str) -> AppResult<Vec<f32>> {
        self.retry
            .run("ollama embedding", || self.request(text))
            .await
    }

    async fn request(&self, text: &str) -> AppResult<Vec<f32>> {
        let response = self
            .http
            .post(&self.url)
            .json(&EmbedRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| map_transport_error("ollama", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OllamaError>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) => body,
            };
            return Err(map_http_error("ollama", status, &message));
        }

        let EmbedResponse { embedding } = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Unexpected Ollama embedding payload: {}", e)))?;
        check_dimensions(self.dimensions, &embedding)?;
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip_all, fields(texts = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            // Blank text has no meaning to embed
            let vector = if text.trim().is_empty() {
                vec![0.0; self.dimensions]
            } else {
                self.embed_retrying(text).await?
            };
            vectors.push(vector);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nomic(endpoint: Option<&str>) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 8,
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_configured_endpoint_wins() {
        assert_eq!(base_url(Some("http://gpu-box:11434/")), "http://gpu-box:11434");
    }

    #[tokio::test]
    async fn test_probe_failure_is_fatal_config() {
        let err = OllamaProvider::with_retry(nomic(Some("http://127.0.0.1:9/")), RetryPolicy::none())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FatalConfig(_)));
        let message = err.to_string();
        assert!(message.contains("http://127.0.0.1:9/api/embeddings"));
        assert!(message.contains("ollama pull nomic-embed-text"));
    }

    #[tokio::test]
    async fn test_against_running_server() {
        let Ok(url) = std::env::var("OLLAMA_URL") else {
            println!("OLLAMA_URL not set, skipping");
            return;
        };

        let provider = OllamaProvider::new(nomic(Some(&url))).await.unwrap();
        let vectors = provider
            .embed_batch(&["Chunk overlap".to_string(), "  ".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 768));
        assert!(vectors[1].iter().all(|&x| x == 0.0));
    }
}
