//! Interactive chat over the corpus.

use clap::Args;
use grounded_core::{config::AppConfig, AppResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question loop
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of chunks to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

#[derive(Debug, PartialEq)]
enum Input<'a> {
    Quit,
    Skip,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Quit
    } else {
        Input::Question(line)
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let knowledge = super::knowledge_config(config, self.top_k)?;
        let system = super::start_system(config, knowledge).await?;

        println!("Ask about your documents. Type 'exit' or 'quit' to leave.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("\n> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match classify(&line) {
                Input::Quit => break,
                Input::Skip => continue,
                Input::Question(question) => match system.answer(question).await {
                    Ok(answer) => print!("{}", super::ask::render_answer(&answer)),
                    Err(e) => {
                        tracing::warn!("Query failed: {}", e);
                        eprintln!("Error: {}", e);
                    }
                },
            }
        }

        println!("Goodbye.");
        Ok(())
    }
}
