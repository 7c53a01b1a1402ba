//! Atlas CLI - group an embedding corpus and lay it out in 2D.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{LayoutCommand, RelayoutCommand};

/// Atlas CLI - group an embedding corpus and lay it out in 2D.
///
/// `layout` groups the input items (remote classifier with local fallback),
/// stores their embeddings and assignment, and writes the layout as JSON.
/// `relayout` recomputes the layout from the store without regrouping.
///
/// Configuration is read from ~/.atlas/config.yaml unless --config is given.
#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Group-based 2D layout for embedding corpora")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.atlas/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Store file (overrides the config file)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input items file (YAML or JSON)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Group items, store them and compute a layout
    Layout(LayoutCommand),
    /// Recompute the layout from stored embeddings and groups
    Relayout(RelayoutCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Layout(cmd) => cmd.run(&cli).await,
        Commands::Relayout(cmd) => cmd.run(&cli).await,
    }
}
