//! DocuDB CLI
//!
//! Command-line tools for DocuDB store files.
//!
//! # Commands
//!
//! - `inspect` - Display store size, framing and record statistics
//! - `verify` - Verify store integrity
//! - `dump` - Print decoded records
//! - `compact` - Rewrite the store without broken or superseded records

mod analysis;
mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::CliError;

/// DocuDB command-line store tools.
#[derive(Parser)]
#[command(name = "docudb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file (`.json`)
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display store statistics
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Verify store integrity
    Verify,

    /// Print decoded records
    Dump {
        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Drop unparseable records and superseded copies of each id
    Compact {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or(CliError::MissingPath { command: "inspect" })?;
            commands::inspect::run(&path, format).await?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or(CliError::MissingPath { command: "verify" })?;
            commands::verify::run(&path).await?;
        }
        Commands::Dump { limit } => {
            let path = cli.path.ok_or(CliError::MissingPath { command: "dump" })?;
            commands::dump::run(&path, limit).await?;
        }
        Commands::Compact { dry_run } => {
            let path = cli.path.ok_or(CliError::MissingPath { command: "compact" })?;
            commands::compact::run(&path, dry_run).await?;
        }
        Commands::Version => {
            println!("DocuDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("DocuDB Core v{}", docudb_core::VERSION);
        }
    }

    Ok(())
}
