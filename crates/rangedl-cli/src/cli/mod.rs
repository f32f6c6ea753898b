//! CLI for the rangedl block downloader.

mod commands;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rangedl_core::config;
use std::path::PathBuf;

use commands::{run_discard, run_get, run_status};

/// Top-level CLI for rangedl.
#[derive(Debug, Parser)]
#[command(name = "rangedl")]
#[command(about = "rangedl: resumable multi-block HTTP downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL, resuming any earlier progress for the same destination.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Destination path (default: file name from the URL, in the current directory).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Block size in bytes (overrides config).
        #[arg(long, value_name = "BYTES")]
        block_size: Option<u64>,

        /// Number of concurrent block workers (overrides config).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// Show the saved block ledger for a destination.
    Status {
        /// Destination path of the download.
        destination: PathBuf,
    },

    /// Delete the temp file and ledger for a destination.
    Discard {
        /// Destination path of the download.
        destination: PathBuf,
    },
}

impl Cli {
    /// Parses arguments and runs the command. `Ok(false)` means the command ran
    /// but the download did not finish.
    pub async fn run_from_args() -> Result<bool> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                url,
                output,
                block_size,
                concurrency,
            } => {
                let mut cfg = config::load_or_init()?;
                if let Some(n) = block_size {
                    cfg.block_size = n;
                }
                if let Some(n) = concurrency {
                    cfg.concurrency = n;
                }
                tracing::debug!("effective config: {:?}", cfg);
                let outcome = run_get(cfg, &url, output).await?;
                Ok(outcome.is_success())
            }
            CliCommand::Status { destination } => {
                run_status(&destination)?;
                Ok(true)
            }
            CliCommand::Discard { destination } => {
                run_discard(&destination)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests;
