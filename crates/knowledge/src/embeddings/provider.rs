//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{OllamaProvider, TrigramProvider};
use grounded_core::{AppError, AppResult};
use std::sync::Arc;

/// Maps text to fixed-length vectors.
///
/// Every vector a provider returns has exactly `dimensions()` elements, and
/// the same text always maps to the same vector for the same model.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Reject vectors whose length differs from the provider's declared size.
pub fn check_dimensions(expected: usize, vector: &[f32]) -> AppResult<()> {
    if vector.len() != expected {
        return Err(AppError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Create an embedding provider based on configuration.
///
/// Remote providers are probed once here, so an unreachable backend or a
/// missing model fails at startup instead of on the first query.
pub async fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    let provider: Arc<dyn EmbeddingProvider> = match config.provider.as_str() {
        "trigram" => Arc::new(TrigramProvider::new(config.dimensions)),
        "ollama" => Arc::new(OllamaProvider::new(config.clone()).await?),
        other => {
            return Err(AppError::FatalConfig(format!(
                "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
                other
            )))
        }
    };

    tracing::info!(embedder = %config.identity(), "Embedding provider ready");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let provider = create_provider(&EmbeddingConfig::default()).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "word2vec".to_string(),
            ..Default::default()
        };

        let err = create_provider(&config).await.unwrap_err();
        assert!(matches!(err, AppError::FatalConfig(_)));
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(3, &[0.0, 1.0, 0.0]).is_ok());
        assert!(matches!(
            check_dimensions(3, &[0.0, 1.0]),
            Err(AppError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
