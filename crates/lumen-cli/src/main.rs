//! Lumen - keep a presence status alive
//!
//! A small CLI that:
//! - Publishes the configured presence and refreshes it until stopped
//! - Manages the local catalog of image assets the presence references
//! - Edits the saved, non-secret configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

use lumen_core::{constants, paths};

mod assets;
mod config;
mod log_transport;
mod run;

/// Lumen - presence session manager
#[derive(Parser)]
#[command(name = "lumen")]
#[command(about = "Keep a presence status alive and manage its image assets", long_about = None)]
struct Cli {
    /// Also mirror logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and keep the configured presence published until Ctrl-C
    Run {
        /// Application id to connect with (defaults to the saved one)
        #[arg(long)]
        app_id: Option<String>,
    },

    /// Manage local image assets
    #[command(subcommand)]
    Asset(assets::AssetCommand),

    /// Show or edit the saved configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Run { app_id } => run::run(app_id).await,
        Commands::Asset(command) => assets::handle(command),
        Commands::Config(command) => config::handle(command),
    }
}

/// Log to ~/.lumen/logs/lumen.log, mirrored to stderr with --verbose
fn init_logging(verbose: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let log_dir = paths::logs_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory: {}", e);
    }

    #[cfg(unix)]
    let null_device = "/dev/null";
    #[cfg(windows)]
    let null_device = "NUL";

    let log_file = match std::fs::File::create(log_dir.join(constants::fs::LOG_FILE_NAME)) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "Failed to create log file: {}, falling back to null device",
                e
            );
            std::fs::File::create(null_device)?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_writer(log_file, verbose))
        .with_ansi(false)
        .init();

    Ok(())
}

fn log_writer(log_file: std::fs::File, verbose: bool) -> BoxMakeWriter {
    let file = std::sync::Mutex::new(log_file);
    if verbose {
        BoxMakeWriter::new(file.and(std::io::stderr))
    } else {
        BoxMakeWriter::new(file)
    }
}
