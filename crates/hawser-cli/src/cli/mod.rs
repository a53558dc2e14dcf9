//! CLI for the hawser object download resolver.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hawser_core::config;
use std::path::PathBuf;

use commands::{run_config, run_get};

/// Top-level CLI for hawser.
#[derive(Debug, Parser)]
#[command(name = "hawser")]
#[command(about = "hawser: fetch media objects from a git-media store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one object by identifier.
    Get {
        /// Object identifier (e.g. "namespace/oid"); the last segment is the object id.
        id: String,

        /// Destination file, or "-" for stdout. Defaults to the object id in the current directory.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Base URL of the media store; overrides the config file.
        #[arg(long, env = "HAWSER_URL", value_name = "URL")]
        url: Option<String>,
    },

    /// Show the effective configuration.
    Config {
        /// Print only the config file path.
        #[arg(long)]
        path: bool,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;

        match cli.command {
            CliCommand::Get { id, output, url } => {
                if let Some(url) = url {
                    cfg.url = url;
                }
                tracing::debug!("effective config: {:?}", cfg);
                run_get(&cfg, &id, output.as_deref())?;
            }
            CliCommand::Config { path } => run_config(&cfg, path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
