//! CLI for the mantis HTTP retry client.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use mantis_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_config, run_send, SendArgs};

/// Top-level CLI for mantis.
#[derive(Debug, Parser)]
#[command(name = "mantis")]
#[command(about = "mantis: send HTTP requests with retries, backoff and throttling", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send one HTTP request through the retry chain.
    Send {
        /// HTTP/HTTPS URL.
        url: String,

        /// Request method (default GET, or POST when a body is given).
        #[arg(short = 'X', long = "request", value_name = "METHOD")]
        method: Option<String>,

        /// Request body.
        #[arg(short = 'd', long = "data", value_name = "DATA", conflicts_with = "data_file")]
        data: Option<String>,

        /// Read the request body from a file; it is re-read from the start on every retry.
        #[arg(long, value_name = "PATH")]
        data_file: Option<PathBuf>,

        /// Extra header, `Name: value`. Repeatable.
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Retries after the first try (overrides config).
        #[arg(long, value_name = "N")]
        attempts: Option<u32>,

        /// Honour Retry-After hints from the server (overrides config).
        #[arg(long)]
        retry_after: bool,

        /// Minimum spacing between sends in milliseconds (overrides config).
        #[arg(long, value_name = "MS")]
        throttle_ms: Option<u64>,

        /// Whole-transfer timeout in seconds (overrides config).
        #[arg(long, value_name = "S")]
        timeout_secs: Option<u64>,
    },

    /// Show the config file path and the effective configuration.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Send {
                url,
                method,
                data,
                data_file,
                headers,
                attempts,
                retry_after,
                throttle_ms,
                timeout_secs,
            } => {
                let mut cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                if let Some(n) = attempts {
                    cfg.retry.attempts = n;
                }
                if retry_after {
                    cfg.retry_after.enabled = true;
                }
                if throttle_ms.is_some() {
                    cfg.throttle.interval_ms = throttle_ms;
                }
                if let Some(s) = timeout_secs {
                    cfg.transport.timeout_secs = s;
                }
                let args = SendArgs {
                    url,
                    method,
                    data,
                    data_file,
                    headers,
                };
                run_send(&cfg, args)?;
            }
            CliCommand::Config => run_config()?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
