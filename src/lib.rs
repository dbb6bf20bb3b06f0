//! Core library entry for the `pyright-bridge` CLI.
//!
//! Builds pyright command lines from settings, runs them with a timeout and
//! cancellation, and classifies what pyright reports.

pub mod adapters;
pub mod cassette;
pub mod check;
pub mod cli;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod logging;
pub mod outcome;
pub mod ports;
pub mod target;

use clap::error::ErrorKind;
use clap::Parser;

pub use commands::Verdict;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<Verdict, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(Verdict::Clean);
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli)
}
