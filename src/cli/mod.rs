use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{DeleteArgs, ExportArgs, NewArgs};

#[derive(Parser, Debug)]
#[command(
    name = "stickies",
    version,
    about = "Inspect and maintain the sticky notes data file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file location (takes precedence over STICKIES_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the notes data file (takes precedence over STICKIES_DATA)
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stored notes in order
    List,
    /// Append a note and save
    New(NewArgs),
    /// Delete the note at an index and save
    Delete(DeleteArgs),
    /// Dump defaults and notes as JSON
    Export(ExportArgs),
    /// Print the resolved data file path
    Path,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_file {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let store = storage::init(&config.storage)?;

    let config = Arc::new(config);
    match cli.command {
        Commands::List => commands::list_notes(config, store),
        Commands::New(args) => commands::new_note(config, store, args),
        Commands::Delete(args) => commands::delete_note(config, store, args),
        Commands::Export(args) => commands::export_notes(config, store, args),
        Commands::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
