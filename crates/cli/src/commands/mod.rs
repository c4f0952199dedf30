//! Command handlers for the grounded CLI.

pub mod ask;
pub mod chat;
pub mod eval;
pub mod ingest;
pub mod retrieve;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use eval::EvalCommand;
pub use ingest::IngestCommand;
pub use retrieve::RetrieveCommand;

use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::{KnowledgeConfig, ProgressReporter, RagSystem};

/// Progress lines go to the log so stdout stays clean for answers.
pub(crate) fn progress_reporter() -> ProgressReporter {
    ProgressReporter::new(|event| tracing::debug!("{}", event.format_simple()))
}

/// Load `.grounded/knowledge.yaml`, applying a `--top-k` override.
pub(crate) fn knowledge_config(config: &AppConfig, top_k: Option<usize>) -> AppResult<KnowledgeConfig> {
    let mut knowledge = KnowledgeConfig::load(&config.workspace)?;
    if let Some(k) = top_k {
        knowledge.top_k = k;
    }
    Ok(knowledge)
}

/// Build the full system: ingest, embed and index the corpus.
pub(crate) async fn start_system(config: &AppConfig, knowledge: KnowledgeConfig) -> AppResult<RagSystem> {
    let system = RagSystem::initialize(config, knowledge, &progress_reporter()).await?;
    tracing::info!(
        chunks = system.ingest_report().chunk_count,
        "System ready"
    );
    Ok(system)
}
