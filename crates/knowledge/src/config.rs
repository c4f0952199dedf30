//! Pipeline configuration.
//!
//! Loaded from `.grounded/knowledge.yaml`. Every field has a default, so a
//! missing file or a partial file is fine.

use crate::chunk::ChunkConfig;
use crate::embeddings::EmbeddingConfig;
use crate::vector_index::Metric;
use grounded_core::{AppError, AppResult};
use grounded_prompt::{DEFAULT_REFUSAL, GROUNDED_ANSWER_ID};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "knowledge.yaml";

/// Chunking, retrieval and generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub chunk: ChunkConfig,

    pub embedding: EmbeddingConfig,

    /// Chunks retrieved per query
    pub top_k: usize,

    pub metric: Metric,

    /// Sampling temperature for generation
    pub temperature: f32,

    /// Upper bound on generated tokens, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Exact text returned when the context lacks the answer
    pub refusal_message: String,

    /// Queries in flight at once for batch answering
    pub max_concurrency: usize,

    /// Per-query deadline for embed, search and generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_timeout_secs: Option<u64>,

    /// Prompt definition used for answering
    pub prompt_id: String,

    /// Append prompt traces to this JSONL file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_file: Option<PathBuf>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            chunk: ChunkConfig::default(),
            embedding: EmbeddingConfig::default(),
            top_k: 4,
            metric: Metric::Cosine,
            temperature: 0.0,
            max_tokens: None,
            refusal_message: DEFAULT_REFUSAL.to_string(),
            max_concurrency: 4,
            query_timeout_secs: None,
            prompt_id: GROUNDED_ANSWER_ID.to_string(),
            trace_file: None,
        }
    }
}

impl KnowledgeConfig {
    /// Path of the config file inside a workspace.
    pub fn path(workspace: &Path) -> PathBuf {
        workspace.join(".grounded").join(CONFIG_FILE)
    }

    /// Load the workspace config, or defaults when the file does not exist.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let path = Self::path(workspace);

        if !path.exists() {
            tracing::debug!("No knowledge config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::FatalConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            AppError::FatalConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        tracing::debug!("Loaded knowledge config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, workspace: &Path) -> AppResult<()> {
        let path = Self::path(workspace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, serde_yaml::to_string(self)?)?;
        tracing::debug!("Saved knowledge config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        self.chunk.validate()?;
        self.embedding.validate()?;

        if self.top_k == 0 {
            return Err(AppError::FatalConfig(
                "top_k must be greater than zero".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::FatalConfig(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }

        if self.max_concurrency == 0 {
            return Err(AppError::FatalConfig(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }

        if self.refusal_message.trim().is_empty() {
            return Err(AppError::FatalConfig(
                "refusal_message must not be empty".to_string(),
            ));
        }

        if self.query_timeout_secs == Some(0) {
            return Err(AppError::FatalConfig(
                "query_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = KnowledgeConfig::default();
        assert_eq!(config.chunk.max_chunk_size, 500);
        assert_eq!(config.chunk.overlap, 50);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.refusal_message, "I don't know based on the provided documents.");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        assert_eq!(KnowledgeConfig::load(temp.path()).unwrap(), KnowledgeConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".grounded")).unwrap();
        fs::write(
            KnowledgeConfig::path(temp.path()),
            "top_k: 2\nmetric: l2\nchunk:\n  max_chunk_size: 200\n  overlap: 20\n  respect_boundaries: true\n",
        )
        .unwrap();

        let config = KnowledgeConfig::load(temp.path()).unwrap();
        assert_eq!(config.top_k, 2);
        assert_eq!(config.metric, Metric::L2);
        assert_eq!(config.chunk.max_chunk_size, 200);
        assert_eq!(config.embedding, EmbeddingConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let config = KnowledgeConfig {
            top_k: 6,
            query_timeout_secs: Some(30),
            ..Default::default()
        };
        config.save(temp.path()).unwrap();

        let loaded = KnowledgeConfig::load(temp.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.query_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_values_are_fatal() {
        let cases = [
            KnowledgeConfig {
                top_k: 0,
                ..Default::default()
            },
            KnowledgeConfig {
                max_concurrency: 0,
                ..Default::default()
            },
            KnowledgeConfig {
                temperature: 3.5,
                ..Default::default()
            },
            KnowledgeConfig {
                refusal_message: "  ".to_string(),
                ..Default::default()
            },
            KnowledgeConfig {
                chunk: ChunkConfig {
                    max_chunk_size: 10,
                    overlap: 10,
                    respect_boundaries: true,
                },
                ..Default::default()
            },
        ];

        for config in cases {
            assert!(matches!(config.validate(), Err(AppError::FatalConfig(_))));
        }
    }

    #[test]
    fn test_unparseable_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".grounded")).unwrap();
        fs::write(KnowledgeConfig::path(temp.path()), "top_k: [not, a, number]\n").unwrap();

        assert!(matches!(
            KnowledgeConfig::load(temp.path()),
            Err(AppError::FatalConfig(_))
        ));
    }
}
