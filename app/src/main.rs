#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    BackupStrategy, BotStrategy, CommandStrategy, DeleteStrategy, GetStrategy, InitStrategy,
    NormalizeStrategy, SetInput, SetStrategy, VersionStrategy,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linkdb")]
#[command(about = "Bidirectional link and tag store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link KEY with every VALUE in both directions
    Set {
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Print the members shared by every key matching the patterns
    Get {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Delete every key matching the patterns and its back-references
    Delete {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Repair missing back-references and migrate legacy Twitter urls
    Normalize,
    /// Write every key to a JSON document
    Backup {
        /// Output file (defaults to backup.path from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the Telegram bot
    Bot,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Set { key, values } => SetStrategy.execute(SetInput { key, values }).await,
        Commands::Get { patterns } => GetStrategy.execute(patterns).await,
        Commands::Delete { patterns } => DeleteStrategy.execute(patterns).await,
        Commands::Normalize => NormalizeStrategy.execute(()).await,
        Commands::Backup { output } => BackupStrategy.execute(output).await,
        Commands::Bot => BotStrategy.execute(()).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
