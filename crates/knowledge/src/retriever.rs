//! Query-time retrieval.

use crate::chunk::Chunk;
use crate::embeddings::EmbeddingEngine;
use crate::vector_index::{ScoredChunk, VectorIndex};
use grounded_core::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Characters of chunk text shown in a retrieval log.
pub const PREVIEW_CHARS: usize = 200;

/// One line of retrieval diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalLog {
    /// 1-based
    pub rank: usize,
    pub score: f32,
    pub source: String,
    pub preview: String,
}

impl RetrievalLog {
    pub fn from_scored(hit: &ScoredChunk) -> Self {
        Self {
            rank: hit.rank,
            score: hit.score,
            source: hit.chunk.source_id.clone(),
            preview: preview(&hit.chunk.text, PREVIEW_CHARS),
        }
    }
}

/// Retrieval diagnostics for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalReport {
    pub query: String,
    pub results: Vec<RetrievalLog>,
}

impl RetrievalReport {
    /// Human-readable multi-line rendering.
    pub fn render(&self) -> String {
        let mut out = format!("Query: {}\n", self.query);
        if self.results.is_empty() {
            out.push_str("  (no results)\n");
        }
        for log in &self.results {
            out.push_str(&format!(
                "  #{} score={:.4} source={}\n     {}\n",
                log.rank,
                log.score,
                log.source,
                log.preview.replace('\n', " ")
            ));
        }
        out
    }
}

/// First `max_chars` characters, with "..." appended when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => format!("{}...", &text[..byte]),
        None => text.to_string(),
    }
}

/// Embeds queries and searches the index.
#[derive(Clone)]
pub struct Retriever {
    embeddings: EmbeddingEngine,
    index: Arc<dyn VectorIndex>,
    default_k: usize,
}

impl Retriever {
    pub fn new(embeddings: EmbeddingEngine, index: Arc<dyn VectorIndex>, default_k: usize) -> Self {
        Self {
            embeddings,
            index,
            default_k,
        }
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Top-k chunks for `query`, best first. `None` uses the configured k.
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> AppResult<Vec<Chunk>> {
        let hits = self.retrieve_scored(query, k).await?;
        Ok(hits.into_iter().map(|hit| hit.chunk).collect())
    }

    /// Like `retrieve`, keeping scores and ranks.
    #[instrument(skip(self))]
    pub async fn retrieve_scored(&self, query: &str, k: Option<usize>) -> AppResult<Vec<ScoredChunk>> {
        if !self.index.is_ready() {
            return Err(AppError::NotReady(
                "Vector index not initialized; build it first".to_string(),
            ));
        }

        let query = query.trim();
        if query.is_empty() {
            tracing::info!("Blank query, nothing to retrieve");
            return Ok(Vec::new());
        }

        let k = k.unwrap_or(self.default_k);
        let vector = self.embeddings.embed_query(query).await?;
        let hits = self.index.search(&vector, k)?;

        tracing::debug!(
            results = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "Retrieved chunks"
        );

        Ok(hits)
    }

    /// Retrieval with rank, score, source and preview for each hit.
    pub async fn retrieve_with_logs(&self, query: &str, k: Option<usize>) -> AppResult<RetrievalReport> {
        let hits = self.retrieve_scored(query, k).await?;
        let results: Vec<RetrievalLog> = hits.iter().map(RetrievalLog::from_scored).collect();

        for log in &results {
            tracing::info!(
                rank = log.rank,
                score = log.score,
                source = %log.source,
                "Retrieved: {}",
                preview(&log.preview, 80)
            );
        }

        Ok(RetrievalReport {
            query: query.trim().to_string(),
            results,
        })
    }
}
