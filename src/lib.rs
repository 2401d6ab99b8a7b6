//! Core library entry for the `trackdown` CLI.
//!
//! The dispatch pipeline lives in [`scan`], [`registry`], [`dispatch`],
//! and [`engine`]; the CLI in [`cli`] and [`commands`] is a thin shell
//! around it.

pub mod adapters;
pub mod callbacks;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod events;
pub mod ports;
pub mod registry;
pub mod report;
pub mod scan;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}
