use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::ConfigLoader;
use crate::records::FileRecordSource;

pub mod commands;

use self::commands::RecordsArgs;

#[derive(Parser, Debug)]
#[command(
    name = "runstats",
    version,
    about = "Terminal viewer for SpeedrunIGT speedrun records"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over RUNSTATS_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over RUNSTATS_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the SpeedrunIGT records directory
    #[arg(long)]
    pub records_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Index records for a period and print them without the TUI
    Records(RecordsArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("RUNSTATS_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("RUNSTATS_DATA", path);
    }
    if let Some(path) = &cli.records_dir {
        env::set_var("RUNSTATS_RECORDS", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let source =
        FileRecordSource::from_config(&config).context("resolving the records directory")?;

    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, loader, Box::new(source))?;
            commands::run_tui(&mut app)
        }
        Commands::Records(args) => commands::print_records(&source, args),
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
