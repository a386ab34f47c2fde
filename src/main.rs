use anyhow::{Context, Result};
use answer_evaluator::{CliOverrides, CompletionClient, ConfigLoader, Evaluator, logger, run_server};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "answer-evaluator", version, about = "Scores free-text exam answers with a language model")]
struct Cli {
    /// TOML config file (defaults to ./evaluator.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding config and environment
    #[arg(long)]
    port: Option<u16>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(&CliOverrides {
        config_path: cli.config,
        port: cli.port,
    })
    .context("refusing to start")?;

    let _log_guard = logger::init(cli.verbose, config.log_file.as_deref());
    tracing::debug!(?config, "configuration loaded");

    let client = CompletionClient::new(&config).context("failed to build upstream client")?;
    let evaluator = Evaluator::new(Arc::new(client), config.max_field_chars);

    run_server(&config, evaluator).await
}
