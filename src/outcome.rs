//! Classification of a finished pyright run.
//!
//! Pyright does not signal its failure modes uniformly through exit codes, so
//! the classifier reads stderr. Checks run in a fixed order: fatal markers,
//! then configuration parse failures, then rejected command-line options.
//! Anything else is a successful run whose stdout is the JSON report, even
//! when pyright exits non-zero because it found diagnostics.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stderr fragments pyright or node print when the checker itself crashes.
const FATAL_MARKERS: [&str; 3] =
    ["Fatal error", "FATAL ERROR", "An internal error occurred"];

/// Suffix pyright prints after a configuration file path it failed to parse.
const UNPARSABLE_CONFIG_SUFFIX: &str = "could not be parsed";

/// `"<path>" could not be parsed`, where `<path>` may itself contain quotes.
///
/// The capture is greedy so it runs to the last quote before the suffix.
/// `.` never crosses a line break, keeping the match on one stderr line.
static UNPARSABLE_CONFIG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(.*)" could not be parsed"#)
        .expect("configuration error pattern is hardcoded and must be valid")
});

/// Lines pyright prints when it rejects a command-line option.
static INVALID_OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(Unexpected|Unknown|Unrecognized) (option|argument|value)")
        .expect("invalid option pattern is hardcoded and must be valid")
});

/// The result of one pyright run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Pyright ran; `stdout` is its raw JSON report.
    Success {
        /// Raw report, passed through untouched.
        stdout: String,
    },
    /// Pyright itself crashed.
    FatalFailure {
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// Pyright could not parse its configuration file.
    InvalidConfiguration {
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
        /// The file pyright rejected, as reported on stderr.
        config_file_path: String,
    },
    /// Pyright rejected the command line this crate built.
    InvalidInvocation {
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
}

impl Outcome {
    /// Whether the run produced a usable report.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Short, stable name of the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::FatalFailure { .. } => "fatal_failure",
            Self::InvalidConfiguration { .. } => "invalid_configuration",
            Self::InvalidInvocation { .. } => "invalid_invocation",
        }
    }

    /// Captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        match self {
            Self::Success { stdout }
            | Self::FatalFailure { stdout, .. }
            | Self::InvalidConfiguration { stdout, .. }
            | Self::InvalidInvocation { stdout, .. } => stdout,
        }
    }

    /// Captured standard error; successful runs do not keep it.
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::FatalFailure { stderr, .. }
            | Self::InvalidConfiguration { stderr, .. }
            | Self::InvalidInvocation { stderr, .. } => Some(stderr.as_str()),
        }
    }
}

/// Stderr looked like a known failure but did not have the expected shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassificationError {
    /// Stderr mentions an unparsable configuration file without a quoted path.
    #[error("pyright reported an unparsable configuration file but no quoted path was found in: {stderr}")]
    MissingConfigPath {
        /// The stderr that failed to match.
        stderr: String,
    },
}

/// Maps a finished run onto an [`Outcome`].
///
/// # Errors
///
/// Returns [`ClassificationError::MissingConfigPath`] when stderr reports an
/// unparsable configuration file in an unexpected format. Such output is
/// never reported as a success.
pub fn classify(exit_code: i32, stdout: &str, stderr: &str) -> Result<Outcome, ClassificationError> {
    let stdout = stdout.to_string();

    if is_fatal(stderr) {
        return Ok(Outcome::FatalFailure { stdout, stderr: stderr.to_string() });
    }

    if stderr.contains(UNPARSABLE_CONFIG_SUFFIX) {
        let config_file_path = extract_config_path(stderr).ok_or_else(|| {
            ClassificationError::MissingConfigPath { stderr: stderr.to_string() }
        })?;
        return Ok(Outcome::InvalidConfiguration {
            stdout,
            stderr: stderr.to_string(),
            config_file_path,
        });
    }

    if INVALID_OPTION_RE.is_match(stderr) {
        return Ok(Outcome::InvalidInvocation { stdout, stderr: stderr.to_string() });
    }

    if exit_code > 1 {
        tracing::warn!(exit_code, "pyright exited abnormally without a recognised error on stderr");
    }
    Ok(Outcome::Success { stdout })
}

fn is_fatal(stderr: &str) -> bool {
    FATAL_MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// Extracts the configuration file path from a parse failure message.
///
/// Returns the text between the first quote on the line and the last quote
/// before `could not be parsed`, so `Config file "/b"az/c.json" could not be
/// parsed.` yields `/b"az/c.json`.
#[must_use]
pub fn extract_config_path(stderr: &str) -> Option<String> {
    UNPARSABLE_CONFIG_RE.captures(stderr).map(|captures| captures[1].to_string())
}
