use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mchbill_core::config::Config;
use mchbill_core::logging::{init_logging_with_config, LogConfig};
use std::path::PathBuf;
use tracing::debug;

mod app;
mod commands;

use app::App;
use commands::{auth::AuthCommand, categories::CategoryCommand, items::ItemCommand};

#[derive(Parser, Debug)]
#[command(name = "mchbill")]
#[command(author, version, about = "Clinic billing catalog and accounts", long_about = None)]
#[command(
    after_help = "With encrypted storage, the idle sign-out timer runs within a single invocation. Sessions otherwise last until `mchbill auth sign-out`."
)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overrides the configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Catalog items
    Items {
        #[command(subcommand)]
        command: ItemCommand,
    },

    /// Catalog categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommand,
    },

    /// Replace the catalog with a JSON backup
    Import {
        file: PathBuf,
    },

    /// Write the catalog as JSON
    Export {
        /// Write a dated backup file into this directory instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Load a baseline catalog if the catalog is empty
    Seed {
        file: PathBuf,
    },

    /// Price items for a patient statement
    Quote {
        /// Items as `<id>` or `<id>:<units>`; medicines use the default course
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Accounts and the active session
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_overrides(|name| std::env::var(name).ok())?;
            config
        }
        None => Config::from_env()?,
    };

    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.to_lowercase();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::from_settings(&config.logging)?)?;
    mchbill_core::metrics::init_metrics();
    debug!(data_dir = %config.storage.data_dir.display(), "Opening stores");

    let app = App::open(config).await?;

    let outcome = match args.command {
        Command::Items { command } => commands::items::run(&app, command).await,
        Command::Categories { command } => commands::categories::run(&app, command).await,
        Command::Import { file } => commands::transfer::import(&app, &file).await,
        Command::Export { out } => commands::transfer::export(&app, out.as_deref()).await,
        Command::Seed { file } => commands::transfer::seed(&app, &file).await,
        Command::Quote { items } => commands::quote::run(&app, &items).await,
        Command::Auth { command } => commands::auth::run(&app, command).await,
    };

    app.finish().await?;
    outcome
}
