//! Ask command handler.
//!
//! Answers one question from the corpus and prints the answer with its
//! sources.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::Answer;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let knowledge = super::knowledge_config(config, self.top_k)?;
        let system = super::start_system(config, knowledge).await?;

        let answer = system.answer(&self.question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            print!("{}", render_answer(&answer));
        }

        Ok(())
    }
}

/// Answer text followed by a deduplicated source list.
pub(crate) fn render_answer(answer: &Answer) -> String {
    let mut out = format!("{}\n", answer.answer);

    let refs = answer.source_refs();
    if !refs.is_empty() {
        out.push_str("\nSources:\n");
        for (i, r) in refs.iter().enumerate() {
            out.push_str(&format!("  [{}] {} ({})\n", i + 1, r.source, r.location));
        }
    }

    out
}
