//! Ingest command handler.
//!
//! Loads and chunks the corpus without building an index, to check what
//! would be answered from.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::{ingest, ChunkPipeline, FileLoader};

/// Load and chunk the corpus, then report what was found
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let data_dir = config.data_path();
        tracing::info!("Executing ingest command for {}", data_dir.display());

        let knowledge = super::knowledge_config(config, None)?;
        let pipeline = ChunkPipeline::new(knowledge.chunk)?;
        let corpus = ingest::load_corpus(
            &data_dir,
            &FileLoader,
            &pipeline,
            &super::progress_reporter(),
        )?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&corpus.report)?);
        } else {
            print!("{}", corpus.report.render());
        }

        Ok(())
    }
}
