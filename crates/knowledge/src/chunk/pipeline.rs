//! Chunking pipeline orchestrator.

use super::{
    splitters::{ChunkSplitter, FallbackSplitter, RecursiveSplitter},
    Chunk,
};
use crate::document::Document;
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Configuration for the chunking pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub overlap: usize,

    /// Cut at paragraph/line/sentence/word boundaries when possible
    pub respect_boundaries: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 500,
            overlap: 50,
            respect_boundaries: true,
        }
    }
}

impl ChunkConfig {
    /// `max_chunk_size` must be positive and larger than `overlap`.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_chunk_size == 0 {
            return Err(AppError::FatalConfig(
                "Chunk size must be greater than zero".to_string(),
            ));
        }

        if self.overlap >= self.max_chunk_size {
            return Err(AppError::FatalConfig(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.overlap, self.max_chunk_size
            )));
        }

        Ok(())
    }
}

/// Chunking pipeline.
pub struct ChunkPipeline {
    config: ChunkConfig,
    splitter: Box<dyn ChunkSplitter>,
}

impl ChunkPipeline {
    /// Create a pipeline, rejecting impossible configurations up front.
    pub fn new(config: ChunkConfig) -> AppResult<Self> {
        config.validate()?;

        let splitter: Box<dyn ChunkSplitter> = if config.respect_boundaries {
            Box::new(RecursiveSplitter)
        } else {
            Box::new(FallbackSplitter)
        };

        Ok(Self { config, splitter })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split one document. Blank documents yield no chunks.
    pub fn process(&self, document: &Document) -> AppResult<Vec<Chunk>> {
        if document.text.trim().is_empty() {
            tracing::debug!("Skipping blank document: {}", document.source());
            return Ok(Vec::new());
        }

        let chunks = self.splitter.split(document, &self.config)?;

        tracing::debug!(
            source = %document.source(),
            chunks = chunks.len(),
            bytes = document.text.len(),
            splitter = self.splitter.name(),
            "Chunked document"
        );

        Ok(chunks)
    }

    /// Split many documents, preserving order.
    pub fn process_all(&self, documents: &[Document]) -> AppResult<Vec<Chunk>> {
        let mut all = Vec::new();
        for document in documents {
            all.extend(self.process(document)?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChunkConfig::default();
        assert_eq!(config.max_chunk_size, 500);
        assert_eq!(config.overlap, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        for (max_chunk_size, overlap) in [(0, 0), (50, 50), (50, 80)] {
            let config = ChunkConfig {
                max_chunk_size,
                overlap,
                respect_boundaries: true,
            };
            assert!(matches!(
                ChunkPipeline::new(config),
                Err(AppError::FatalConfig(_))
            ));
        }
    }

    #[test]
    fn test_empty_and_blank_documents() {
        let pipeline = ChunkPipeline::new(ChunkConfig::default()).unwrap();
        assert!(pipeline.process(&Document::new("empty", "")).unwrap().is_empty());
        assert!(pipeline.process(&Document::new("blank", " \n ")).unwrap().is_empty());
    }

    #[test]
    fn test_pipeline_long_document() {
        let pipeline = ChunkPipeline::new(ChunkConfig::default()).unwrap();
        let doc = Document::new("long.md", "This is a sentence about retrieval. ".repeat(100));

        let chunks = pipeline.process(&doc).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 500);
            assert_eq!(chunk.source_id, "long.md");
            assert_eq!(chunk.metadata.document, doc.metadata);
        }
        for pair in chunks.windows(2) {
            assert_eq!(
                pair[1].metadata.char_range.0,
                pair[0].metadata.char_range.1 - 50
            );
        }
    }

    #[test]
    fn test_process_all_keeps_document_order() {
        let pipeline = ChunkPipeline::new(ChunkConfig::default()).unwrap();
        let docs = vec![
            Document::new("a.md", "First document."),
            Document::new("b.md", ""),
            Document::new("c.md", "Third document."),
        ];

        let chunks = pipeline.process_all(&docs).unwrap();
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a.md#0", "c.md#0"]);
    }
}
