//! Retrieval diagnostics.
//!
//! Shows what the retriever returns for each query without calling the
//! generation backend.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};

/// Show ranked chunks for one or more queries
#[derive(Args, Debug)]
pub struct RetrieveCommand {
    /// Queries to run
    #[arg(required = true)]
    pub queries: Vec<String>,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RetrieveCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing retrieve command for {} queries", self.queries.len());

        let knowledge = super::knowledge_config(config, self.top_k)?;
        let system = super::start_system(config, knowledge).await?;

        let mut reports = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            reports.push(system.retrieve_with_logs(query, None).await?);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            for report in &reports {
                println!("{}", report.render());
            }
        }

        Ok(())
    }
}
