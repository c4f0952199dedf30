//! Evaluation command handler.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use grounded_knowledge::eval::load_cases;
use grounded_knowledge::run_eval;
use std::path::PathBuf;

/// Run an evaluation set and grade refusals
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// JSON file with {question, ground_truth, type} cases
    pub file: PathBuf,

    /// Where to write the report
    #[arg(short, long, default_value = "eval_output.txt")]
    pub output: PathBuf,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command on {}", self.file.display());

        let cases = load_cases(&self.file)?;
        let knowledge = super::knowledge_config(config, None)?;
        let system = super::start_system(config, knowledge).await?;

        let summary = run_eval(&system, cases).await;
        let report = summary.render();

        println!("{}", report);
        std::fs::write(&self.output, format!("{}\n", report))?;
        println!("\nReport saved to {}", self.output.display());

        Ok(())
    }
}
