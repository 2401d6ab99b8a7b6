//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `trackdown`.
#[derive(Debug, Parser)]
#[command(name = "trackdown", version, about = "Dispatch test outcomes to an issue tracker")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dispatch a stream of test-outcome events to the tracker.
    Run {
        /// Configuration file.
        #[arg(long, default_value = "trackdown.yaml")]
        config: PathBuf,
        /// JSON-lines event file, or `-` for stdin.
        #[arg(long, default_value = "-")]
        events: PathBuf,
    },
    /// Validate the configuration without touching the network.
    Check {
        /// Configuration file.
        #[arg(long, default_value = "trackdown.yaml")]
        config: PathBuf,
    },
}
