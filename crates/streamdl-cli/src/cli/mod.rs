//! CLI for the streamdl downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamdl_core::config;

use commands::{run_checksum, run_get, GetArgs};

/// Top-level CLI for streamdl.
#[derive(Debug, Parser)]
#[command(name = "streamdl")]
#[command(about = "streamdl: streaming single-GET HTTP downloader", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the XDG config path.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL with one GET, streaming the body to a file or stdout.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,
        /// Write the body here instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Expected SHA-256 (hex) of the body; mismatch is an error.
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                url,
                output,
                sha256,
            } => {
                let cfg = match cli.config.as_deref() {
                    Some(path) => config::load_from(path)?,
                    None => config::load_or_init()?,
                };
                tracing::debug!("loaded config: {:?}", cfg);
                run_get(
                    cfg,
                    GetArgs {
                        url,
                        output,
                        sha256,
                    },
                )
                .await?
            }
            CliCommand::Checksum { path } => run_checksum(&path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
