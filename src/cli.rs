//! CLI module for scanforge

use clap::{Parser, Subcommand};

/// Scanforge server CLI
#[derive(Parser, Debug)]
#[command(name = "scanforge")]
#[command(about = "LLM vulnerability scan orchestration service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) | None => crate::server::run().await,
    }
}
