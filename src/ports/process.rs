//! Process runner port for executing pyright.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::command::CommandSpec;

/// Boxed future type alias used by [`ProcessRunner`] to keep the trait dyn-compatible.
pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<ProcessOutput, RunError>> + Send + 'a>>;

/// Everything a finished process left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// The exit code, or `-1` when the process was ended by a signal.
    pub exit_code: i32,
    /// The captured standard output.
    pub stdout: String,
    /// The captured standard error.
    pub stderr: String,
}

/// Why a run produced no output to classify.
#[derive(Debug, Error)]
pub enum RunError {
    /// The executable could not be started.
    #[error("failed to spawn {executable}: {source}")]
    Spawn {
        /// Executable that failed to start.
        executable: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Waiting for the process or draining its pipes failed.
    #[error("i/o error while running pyright: {0}")]
    Io(#[from] std::io::Error),
    /// The process outlived its time limit and was killed.
    #[error("pyright did not finish within {0:?}")]
    TimedOut(Duration),
    /// The caller cancelled the run; the process was killed.
    #[error("run cancelled")]
    Cancelled,
    /// A stream exceeded the capture limit; the process was killed.
    #[error("pyright wrote more than {limit} bytes to {stream}")]
    OutputLimitExceeded {
        /// `stdout` or `stderr`.
        stream: &'static str,
        /// The configured limit in bytes.
        limit: usize,
    },
    /// A recorded run could not be replayed.
    #[error("replay failed: {0}")]
    Replay(String),
}

impl RunError {
    /// Whether the run ended because the caller cancelled it.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A [`RunError`] as stored in a cassette, keeping its kind.
///
/// I/O errors keep only their message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedRunError {
    /// See [`RunError::Spawn`].
    Spawn {
        /// Executable that failed to start.
        executable: String,
        /// Message of the underlying I/O error.
        message: String,
    },
    /// See [`RunError::Io`].
    Io {
        /// Message of the underlying I/O error.
        message: String,
    },
    /// See [`RunError::TimedOut`].
    TimedOut {
        /// The time limit that expired.
        timeout: Duration,
    },
    /// See [`RunError::Cancelled`].
    Cancelled,
    /// See [`RunError::OutputLimitExceeded`].
    OutputLimitExceeded {
        /// `stdout` or `stderr`.
        stream: String,
        /// The configured limit in bytes.
        limit: usize,
    },
    /// See [`RunError::Replay`].
    Replay {
        /// Why replay failed.
        message: String,
    },
}

impl From<&RunError> for RecordedRunError {
    fn from(error: &RunError) -> Self {
        match error {
            RunError::Spawn { executable, source } => {
                Self::Spawn { executable: executable.clone(), message: source.to_string() }
            }
            RunError::Io(source) => Self::Io { message: source.to_string() },
            RunError::TimedOut(timeout) => Self::TimedOut { timeout: *timeout },
            RunError::Cancelled => Self::Cancelled,
            RunError::OutputLimitExceeded { stream, limit } => {
                Self::OutputLimitExceeded { stream: (*stream).to_string(), limit: *limit }
            }
            RunError::Replay(message) => Self::Replay { message: message.clone() },
        }
    }
}

impl From<RecordedRunError> for RunError {
    fn from(recorded: RecordedRunError) -> Self {
        match recorded {
            RecordedRunError::Spawn { executable, message } => {
                Self::Spawn { executable, source: std::io::Error::other(message) }
            }
            RecordedRunError::Io { message } => Self::Io(std::io::Error::other(message)),
            RecordedRunError::TimedOut { timeout } => Self::TimedOut(timeout),
            RecordedRunError::Cancelled => Self::Cancelled,
            RecordedRunError::OutputLimitExceeded { stream, limit } => {
                let stream = if stream == "stderr" { "stderr" } else { "stdout" };
                Self::OutputLimitExceeded { stream, limit }
            }
            RecordedRunError::Replay { message } => Self::Replay(message),
        }
    }
}

/// Runs one [`CommandSpec`] to completion.
///
/// Abstracting process execution allows deterministic replay by recording
/// and replaying process results during cassette playback.
pub trait ProcessRunner: Send + Sync {
    /// Spawns the process described by `spec` and captures both streams.
    ///
    /// When `cancel` fires before the process exits, the process is killed
    /// and reaped and [`RunError::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, is cancelled, times
    /// out, or exceeds the output limit.
    fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> RunFuture<'a>;
}
