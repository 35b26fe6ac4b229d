mod commands;
mod logging;
mod network;
mod notifier;
mod render;
mod singleton;
mod watcher;

use anyhow::{Context, Result};
use calsync_core::Paths;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Keep local calendar files in sync with calendar URLs")]
struct Cli {
    /// Calendar directory (default: ~/.calsync)
    #[arg(long, global = true, env = "CALSYNC_DIR")]
    dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync daemon in the foreground
    Run {
        /// Skip the NetworkManager check and always treat the network as up
        #[arg(long)]
        assume_online: bool,
    },
    /// Sync every calendar once and exit
    Sync {
        /// Only sync this calendar (by name)
        #[arg(short, long)]
        resource: Option<String>,
    },
    /// Show each calendar's files and last snapshot
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::from_arg(cli.dir.as_deref())?;
    paths.ensure_dirs()?;

    // Watcher events carry absolute paths, so calendar paths must too.
    let base = paths
        .base_dir()
        .canonicalize()
        .with_context(|| format!("Could not resolve {}", paths.base_dir().display()))?;
    let paths = Paths::new(base);

    logging::init(&paths)?;

    match cli.command {
        Commands::Run { assume_online } => commands::run::run(&paths, assume_online).await,
        Commands::Sync { resource } => commands::sync::run(&paths, resource.as_deref()).await,
        Commands::Status => commands::status::run(&paths),
    }
}
