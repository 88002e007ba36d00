use anyhow::{Context, Result};
use chatstore_infrastructure::{DirContextStore, StoreConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "chatstore")]
#[command(about = "Inspect and maintain a per-owner context store", long_about = None)]
struct Cli {
    /// Store root (overrides the config file and CHATSTORE_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move legacy layouts into owner partitions
    Migrate,
    /// List persisted contexts, most recent activity first
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print a context as its JSON document
    Export {
        id: String,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Import exported documents under fresh ids and save them
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Delete a context and its attachments from every location
    Remove { id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StoreConfig::load(cli.config.as_deref())
        .context("Failed to load store configuration")?
        .with_root_override(cli.root);
    tracing::debug!("Using store root {}", config.root.display());
    let store = DirContextStore::with_defaults(&config);

    match cli.command {
        Commands::Migrate => commands::migrate::run(&store)?,
        Commands::List { owner } => commands::list::run(&store, owner.as_deref())?,
        Commands::Export { id, owner } => commands::transfer::export(&store, &id, owner.as_deref())?,
        Commands::Import { files, owner } => {
            commands::transfer::import(&store, &files, owner.as_deref())?
        }
        Commands::Remove { id } => commands::remove::run(&store, &id)?,
    }

    Ok(())
}
