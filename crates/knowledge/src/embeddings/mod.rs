//! Embedding generation.
//!
//! Providers turn text into fixed-size vectors; `EmbeddingEngine` batches
//! requests and enforces the dimension invariant on every returned vector.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{check_dimensions, create_provider, EmbeddingProvider};

use crate::chunk::Chunk;
use crate::progress::{ProgressPhase, ProgressReporter};
use grounded_core::{AppError, AppResult};
use std::sync::Arc;

/// Batching front end over a single provider.
#[derive(Debug, Clone)]
pub struct EmbeddingEngine {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl EmbeddingEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    /// Embed a query string.
    pub async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        check_dimensions(self.provider.dimensions(), &vector)?;
        Ok(vector)
    }

    /// Embed texts in batches of `batch_size`, preserving order.
    pub async fn embed_texts(
        &self,
        texts: &[String],
        progress: &ProgressReporter,
    ) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            "Embedding {} texts using provider '{}' (model: {})",
            texts.len(),
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let expected = self.provider.dimensions();
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let vectors = self.provider.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Knowledge(format!(
                    "Provider returned {} embeddings for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            for vector in &vectors {
                check_dimensions(expected, vector)?;
            }
            embeddings.extend(vectors);

            progress.report(
                ProgressPhase::Embed,
                embeddings.len(),
                texts.len(),
                format!("Embedded {}/{} chunks", embeddings.len(), texts.len()),
            );
        }

        tracing::debug!(
            "Generated {} embeddings of dimension {}",
            embeddings.len(),
            expected
        );

        Ok(embeddings)
    }

    /// Embed chunk texts.
    pub async fn embed_chunks(
        &self,
        chunks: &[Chunk],
        progress: &ProgressReporter,
    ) -> AppResult<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        self.embed_texts(&texts, progress).await
    }
}
