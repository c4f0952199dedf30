//! Embedding settings.

use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Which embedder to use and how to feed it.
///
/// `provider`, `model` and `dimensions` name the vector space. Build-time
/// and query-time vectors must come from the same one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// "trigram" or "ollama"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    /// Texts per `embed_batch` call during ingestion
    pub batch_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: 64,
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Short label for logs, e.g. `ollama/nomic-embed-text@768`.
    pub fn identity(&self) -> String {
        format!("{}/{}@{}", self.provider, self.model, self.dimensions)
    }

    pub fn validate(&self) -> AppResult<()> {
        let problem = if self.dimensions == 0 {
            "dimensions must be positive"
        } else if self.batch_size == 0 {
            "batch_size must be positive"
        } else if self.model.trim().is_empty() {
            "model is empty"
        } else {
            return Ok(());
        };

        Err(AppError::FatalConfig(format!(
            "Invalid embedding settings ({}): {}",
            self.identity(),
            problem
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_default() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.identity(), "trigram/trigram-v1@384");
        assert_eq!(config.batch_size, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: EmbeddingConfig = serde_yaml::from_str(
            "provider: ollama\nmodel: nomic-embed-text\ndimensions: 768\n",
        )
        .unwrap();
        assert_eq!(config.identity(), "ollama/nomic-embed-text@768");
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn test_validate_rejects_degenerate_settings() {
        for broken in [
            EmbeddingConfig { dimensions: 0, ..Default::default() },
            EmbeddingConfig { batch_size: 0, ..Default::default() },
            EmbeddingConfig { model: " ".to_string(), ..Default::default() },
        ] {
            assert!(matches!(broken.validate(), Err(AppError::FatalConfig(_))));
        }
    }
}
