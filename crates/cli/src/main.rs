//! Grounded CLI
//!
//! Main entry point for the `grounded` command-line tool: question answering
//! strictly from a local document corpus.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, EvalCommand, IngestCommand, RetrieveCommand};
use grounded_core::config::{AppConfig, CliOverrides};
use grounded_core::{logging, AppResult};
use std::path::PathBuf;

/// Grounded - answers from your documents, or an honest "I don't know"
#[derive(Parser, Debug)]
#[command(name = "grounded")]
#[command(about = "Strictly grounded question answering over a local corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "GROUNDED_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "GROUNDED_CONFIG")]
    config: Option<PathBuf>,

    /// Corpus directory (default: <workspace>/data)
    #[arg(short, long, global = true, env = "GROUNDED_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, openai, groq)
    #[arg(short, long, global = true, env = "GROUNDED_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "GROUNDED_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question
    Ask(AskCommand),

    /// Interactive question loop
    Chat(ChatCommand),

    /// Show retrieval results without generating an answer
    Retrieve(RetrieveCommand),

    /// Run an evaluation set
    Eval(EvalCommand),

    /// Load and chunk the corpus and report the result
    Ingest(IngestCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let overrides = CliOverrides {
        workspace: cli.workspace,
        config_file: cli.config,
        data_dir: cli.data_dir,
        provider: cli.provider,
        model: cli.model,
        log_level: cli.log_level,
        log_json: cli.log_json,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    let config = AppConfig::load(&overrides)?;

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    tracing::info!("Grounded CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Data directory: {:?}", config.data_path());
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Retrieve(_) => "retrieve",
        Commands::Eval(_) => "eval",
        Commands::Ingest(_) => "ingest",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
