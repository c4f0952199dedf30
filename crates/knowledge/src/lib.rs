//! Grounded document question answering.
//!
//! Documents are cleaned, cut into overlapping chunks, embedded and held in
//! an in-memory vector index. A question retrieves the top-k chunks, which
//! become the only context a generation backend may answer from; when the
//! context lacks the answer the backend must return a fixed refusal string.
//!
//! # Example
//! ```no_run
//! use grounded_core::config::{AppConfig, CliOverrides};
//! use grounded_knowledge::{KnowledgeConfig, ProgressReporter, RagSystem};
//!
//! # async fn example() -> grounded_core::AppResult<()> {
//! let app = AppConfig::load(&CliOverrides::default())?;
//! let config = KnowledgeConfig::load(&app.workspace)?;
//! let system = RagSystem::initialize(&app, config, &ProgressReporter::silent()).await?;
//!
//! let answer = system.answer("What does chunk overlap improve?").await?;
//! println!("{}", answer.answer);
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod eval;
pub mod ingest;
pub mod parser;
pub mod progress;
pub mod rag;
pub mod retriever;
pub mod system;
pub mod trace;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunk::{Chunk, ChunkConfig, ChunkMetadata, ChunkPipeline};
pub use config::KnowledgeConfig;
pub use document::{Document, Metadata, MetadataValue};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingEngine, EmbeddingProvider};
pub use eval::{run_eval, EvalCase, EvalSummary, Grade};
pub use ingest::{IngestReport, SkippedFile};
pub use parser::{clean_text, DocumentSource, FileLoader};
pub use progress::{ProgressEvent, ProgressPhase, ProgressReporter};
pub use rag::{Answer, AnswerComposer, RagSourceRef};
pub use retriever::{RetrievalLog, RetrievalReport, Retriever};
pub use system::{RagSystem, SystemComponents, SystemHandle};
pub use trace::{JsonlSink, MemorySink, PromptTrace, TraceSink, TracingSink};
pub use vector_index::{FlatIndex, IndexEntry, Metric, ScoredChunk, VectorIndex};
