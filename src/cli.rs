//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{Locale, SeverityLevel, Settings};

/// Top-level CLI parser for `pyright-bridge`.
#[derive(Debug, Parser)]
#[command(name = "pyright-bridge", version, about = "Run pyright and classify what it reports")]
pub struct Cli {
    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Project selection and settings overrides.
#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Project root; defaults to the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<PathBuf>,
    /// Settings file; defaults to `.pyright-bridge.yaml` in the project root.
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,
    /// Pyright executable.
    #[arg(long, global = true, value_name = "PATH")]
    pub executable: Option<PathBuf>,
    /// Python interpreter passed to pyright.
    #[arg(long, global = true, value_name = "PATH")]
    pub interpreter: Option<PathBuf>,
    /// Pyright configuration file, used instead of the project root.
    #[arg(long, global = true, value_name = "FILE")]
    pub config_file: Option<PathBuf>,
    /// Minimum severity to report (error, warning, information).
    #[arg(long, global = true, value_name = "LEVEL")]
    pub level: Option<SeverityLevel>,
    /// Number of pyright threads; 0 leaves pyright's default.
    #[arg(long, global = true, value_name = "N")]
    pub threads: Option<u32>,
    /// Locale for pyright's messages, e.g. `de` or `zh-cn`.
    #[arg(long, global = true, value_name = "LOCALE")]
    pub locale: Option<Locale>,
    /// Seconds before a pyright run is killed; 0 disables the limit.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// Answer runs from a recorded cassette instead of starting pyright.
    #[arg(long, global = true, value_name = "CASSETTE")]
    pub replay: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

impl GlobalArgs {
    /// Applies command-line overrides, which win over file and environment.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(executable) = &self.executable {
            settings.executable = Some(executable.clone());
        }
        if let Some(interpreter) = &self.interpreter {
            settings.interpreter = Some(interpreter.clone());
        }
        if let Some(config_file) = &self.config_file {
            settings.configuration_file = Some(config_file.clone());
        }
        if let Some(level) = self.level {
            settings.minimum_severity_level = level;
        }
        if let Some(threads) = self.threads {
            settings.number_of_threads = threads;
        }
        if let Some(locale) = self.locale {
            settings.locale = locale;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
    }
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check files with pyright and print each report.
    Check {
        /// Files to check.
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Print every outcome as a JSON line instead of the raw reports.
        #[arg(long)]
        json: bool,
    },
    /// Print the pyright invocation for a file without running it.
    Command {
        /// File the invocation would check.
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the invocation as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Classify output captured from an earlier pyright run.
    Classify {
        /// Exit code of the run.
        #[arg(long, allow_negative_numbers = true)]
        exit_code: i32,
        /// File holding the captured standard output.
        #[arg(long, value_name = "FILE")]
        stdout: Option<PathBuf>,
        /// File holding the captured standard error.
        #[arg(long, value_name = "FILE")]
        stderr: Option<PathBuf>,
    },
}
