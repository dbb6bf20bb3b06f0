//! `pyright-bridge check` command.

use std::path::PathBuf;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::{render, runtime, Verdict};
use crate::check::CheckError;
use crate::command::CommandSpec;
use crate::context::ServiceContext;
use crate::outcome::Outcome;
use crate::target;

/// Execute the `check` command.
///
/// Reports go to stdout as they were produced; failure diagnostics go to
/// stderr.
///
/// # Errors
///
/// Returns an error string if a file cannot be resolved into a pyright
/// command, or if any run fails, is cancelled or cannot be classified.
pub fn run_with_context(ctx: &ServiceContext, files: &[PathBuf], json: bool) -> Result<Verdict, String> {
    let specs = commands_for(ctx, files)?;
    let runtime = runtime()?;

    let results = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
        let results = ctx.checker().check_all(specs, &cancel).await;
        interrupt.abort();
        results
    });

    report(&results, json)
}

fn commands_for(ctx: &ServiceContext, files: &[PathBuf]) -> Result<Vec<CommandSpec>, String> {
    let config = ctx.settings.snapshot();
    files
        .iter()
        .map(|file| {
            target::for_file(ctx.project.as_ref(), &config, file).ok_or_else(|| {
                format!(
                    "Cannot check {}: the file, a single module, pyright or a Python \
                     interpreter could not be found (rerun with -vv for details)",
                    file.display()
                )
            })
        })
        .collect()
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupted, cancelling pyright runs");
        cancel.cancel();
    }
}

fn report(results: &[(CommandSpec, Result<Outcome, CheckError>)], json: bool) -> Result<Verdict, String> {
    let mut errors = Vec::new();
    let mut successes = Vec::with_capacity(results.len());

    for (spec, result) in results {
        match result {
            Ok(outcome) => {
                successes.push(outcome.is_success());
                if json {
                    println!("{}", json!({ "file": spec.target(), "outcome": outcome }));
                } else if let Some(text) = render::failure(spec.target(), outcome) {
                    eprintln!("{text}");
                } else {
                    println!("{}", outcome.stdout());
                }
            }
            Err(error) if error.is_cancelled() => return Err("Check cancelled".to_string()),
            Err(error) => errors.push(format!("{}: {error}", spec.target())),
        }
    }

    if errors.is_empty() {
        Ok(Verdict::from_successes(successes.into_iter()))
    } else {
        Err(errors.join("\n"))
    }
}
