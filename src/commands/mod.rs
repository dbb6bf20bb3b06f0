//! Command dispatch and handlers.

pub mod check;
pub mod classify;
pub mod invocation;
pub mod render;

use std::env;
use std::path::{Path, PathBuf};

use crate::cassette::session::RecordingSession;
use crate::cli::{Cli, Command, GlobalArgs};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::logging;

/// Environment variable naming the directory recorded sessions go to.
pub const RECORD_ENV_VAR: &str = "PYRIGHT_BRIDGE_RECORD";

/// How a successfully executed command judged its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every file or capture classified as success.
    Clean,
    /// At least one outcome was a failure.
    Failed,
}

impl Verdict {
    /// `Failed` if any item failed.
    #[must_use]
    pub fn from_successes(mut successes: impl Iterator<Item = bool>) -> Self {
        if successes.all(|ok| ok) {
            Self::Clean
        } else {
            Self::Failed
        }
    }
}

/// Dispatch a parsed command line to its handler.
///
/// `classify` works on captured output alone; every other command gets a
/// [`ServiceContext`] built from the project's settings.
///
/// # Errors
///
/// Returns an error string if settings cannot be loaded or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<Verdict, String> {
    logging::init(cli.global.verbose);

    match &cli.command {
        Command::Classify { exit_code, stdout, stderr } => {
            classify::run(*exit_code, stdout.as_deref(), stderr.as_deref())
        }
        Command::Check { files, json } => {
            with_context(&cli.global, |ctx| check::run_with_context(ctx, files, *json))
        }
        Command::Command { file, json } => {
            with_context(&cli.global, |ctx| invocation::run_with_context(ctx, file, *json))
        }
    }
}

/// Builds the service context and runs `handler` with it.
///
/// When `PYRIGHT_BRIDGE_RECORD` is set to a directory path, every pyright run
/// is recorded to a cassette in a new session under that directory.
fn with_context(
    global: &GlobalArgs,
    handler: impl FnOnce(&ServiceContext) -> Result<Verdict, String>,
) -> Result<Verdict, String> {
    let cwd = env::current_dir().map_err(|e| format!("Failed to read current directory: {e}"))?;
    let root = global.project_root.as_ref().map_or_else(|| cwd.clone(), |root| cwd.join(root));
    let settings = load_settings(global, &root, &cwd)?;

    let (ctx, session) = if let Some(cassette) = &global.replay {
        (ServiceContext::replaying(Some(root), settings, cassette)?, None)
    } else if let Ok(path) = env::var(RECORD_ENV_VAR) {
        let (ctx, session) = ServiceContext::recording_at(Some(root), settings, Path::new(&path))?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(Some(root), settings), None)
    };

    let result = handler(&ctx);

    if let Some(session) = session {
        // The recorder is shared with the context's runner.
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Settings file, then environment, then command line. Paths given on the
/// command line are taken relative to the working directory.
fn load_settings(global: &GlobalArgs, root: &Path, cwd: &Path) -> Result<Settings, String> {
    let explicit = global.settings.as_ref().map(|path| cwd.join(path));
    let mut settings = Settings::load(root, explicit.as_deref()).map_err(|e| e.to_string())?;
    global.apply_to(&mut settings);
    settings.resolve_relative_to(cwd);
    Ok(settings)
}

/// Multi-threaded runtime for the async handlers.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir: PathBuf = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
