//! CLI for the SBU batch uploader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sbu_core::config;
use std::path::Path;

use commands::{run_batch, run_peek, run_quota_reset, run_status};

/// Top-level CLI for the SBU batch uploader.
#[derive(Debug, Parser)]
#[command(name = "sbu")]
#[command(about = "SBU: quota-aware batch uploader for Shorts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload the next batch of queued videos.
    Run {
        /// Path to the CSV work queue.
        #[arg(long, default_value = "videos.csv", value_name = "FILE")]
        queue: String,

        /// Upload at most N videos this run (default from config).
        #[arg(long, value_name = "N")]
        max_items: Option<usize>,

        /// Seconds to pause between videos (default from config).
        #[arg(long, value_name = "S")]
        settle_secs: Option<u64>,

        /// Environment variable holding the OAuth bearer token.
        #[arg(long, default_value = "YOUTUBE_ACCESS_TOKEN", value_name = "VAR")]
        token_env: String,
    },

    /// Show quota usage and time until the next reset.
    Status,

    /// Zero the quota ledger and start a fresh window now.
    QuotaReset,

    /// List pending queue rows without uploading anything.
    Peek {
        /// Path to the CSV work queue.
        #[arg(long, default_value = "videos.csv", value_name = "FILE")]
        queue: String,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                queue,
                max_items,
                settle_secs,
                token_env,
            } => run_batch(&cfg, Path::new(&queue), max_items, settle_secs, &token_env)?,
            CliCommand::Status => run_status(&cfg)?,
            CliCommand::QuotaReset => run_quota_reset(&cfg)?,
            CliCommand::Peek { queue } => run_peek(Path::new(&queue))?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
