//! Run-then-classify pipeline.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::command::CommandSpec;
use crate::outcome::{classify, ClassificationError, Outcome};
use crate::ports::process::{ProcessRunner, RunError};

/// Why a check produced no [`Outcome`].
#[derive(Debug, Error)]
pub enum CheckError {
    /// The process could not be run to completion.
    #[error(transparent)]
    Run(#[from] RunError),
    /// The process ran but its stderr broke a classification assumption.
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

impl CheckError {
    /// Whether the check was cancelled by the caller.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Run(RunError::Cancelled))
    }
}

/// Runs pyright invocations and classifies what they report.
///
/// Every check owns one process; checks share nothing but the runner, so
/// any number may be in flight at once.
#[derive(Clone)]
pub struct Checker {
    runner: Arc<dyn ProcessRunner>,
}

impl Checker {
    /// Creates a checker on top of `runner`.
    #[must_use]
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Runs `spec` and classifies the result.
    ///
    /// A cancelled run is never classified.
    ///
    /// # Errors
    ///
    /// Returns an error if the run fails or is cancelled, or if stderr does
    /// not have the shape its failure kind requires.
    pub async fn check(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<Outcome, CheckError> {
        let output = self.runner.run(spec, cancel).await?;
        let outcome = classify(output.exit_code, &output.stdout, &output.stderr)?;
        tracing::info!(file = spec.target(), outcome = outcome.kind(), "pyright check finished");
        Ok(outcome)
    }

    /// Checks every spec concurrently, one process each.
    ///
    /// Results come back in the order of `specs`. Cancelling `cancel` stops
    /// every run still in flight.
    pub async fn check_all(
        &self,
        specs: Vec<CommandSpec>,
        cancel: &CancellationToken,
    ) -> Vec<(CommandSpec, Result<Outcome, CheckError>)> {
        let mut tasks = JoinSet::new();
        let count = specs.len();

        for (index, spec) in specs.into_iter().enumerate() {
            let checker = self.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let result = checker.check(&spec, &cancel).await;
                (index, spec, result)
            });
        }

        let mut results = Vec::with_capacity(count);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
                Err(error) => tracing::error!(%error, "check task aborted"),
            }
        }

        results.sort_by_key(|(index, _, _)| *index);
        results.into_iter().map(|(_, spec, result)| (spec, result)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::config::ConfigurationSnapshot;
    use crate::ports::process::{ProcessOutput, RunFuture};

    /// Answers each run from a fixed script keyed by target, recording calls.
    struct ScriptedRunner {
        delay: Duration,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(delay: Duration) -> Self {
            Self { delay, calls: Mutex::new(Vec::new()) }
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> RunFuture<'a> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(spec.target().to_string());
                tokio::select! {
                    () = tokio::time::sleep(self.delay) => {}
                    () = cancel.cancelled() => return Err(RunError::Cancelled),
                }
                let stderr = match spec.target() {
                    "/p/crash.py" => "Fatal error: boom",
                    "/p/config.py" => "Config file \"/p/pyrightconfig.json\" could not be parsed.",
                    "/p/broken.py" => "Config file could not be parsed.",
                    _ => "",
                };
                Ok(ProcessOutput { exit_code: 0, stdout: format!("report {}", spec.target()), stderr: stderr.into() })
            })
        }
    }

    fn spec(target: &str) -> CommandSpec {
        CommandSpec::build(
            &ConfigurationSnapshot::default(),
            Path::new("/bin/pyright"),
            Path::new(target),
            Path::new("/p"),
            Path::new("/bin/python3"),
        )
    }

    #[tokio::test]
    async fn check_classifies_run_output() {
        let checker = Checker::new(Arc::new(ScriptedRunner::new(Duration::ZERO)));
        let cancel = CancellationToken::new();

        let ok = checker.check(&spec("/p/a.py"), &cancel).await.unwrap();
        assert_eq!(ok, Outcome::Success { stdout: "report /p/a.py".into() });

        let fatal = checker.check(&spec("/p/crash.py"), &cancel).await.unwrap();
        assert_eq!(fatal.kind(), "fatal_failure");
    }

    #[tokio::test]
    async fn malformed_config_error_is_not_success() {
        let checker = Checker::new(Arc::new(ScriptedRunner::new(Duration::ZERO)));

        let result = checker.check(&spec("/p/broken.py"), &CancellationToken::new()).await;

        assert!(matches!(result, Err(CheckError::Classification(_))));
    }

    #[tokio::test]
    async fn check_all_keeps_input_order() {
        let checker = Checker::new(Arc::new(ScriptedRunner::new(Duration::from_millis(5))));
        let specs = vec![spec("/p/a.py"), spec("/p/config.py"), spec("/p/crash.py")];

        let results = checker.check_all(specs, &CancellationToken::new()).await;

        let kinds: Vec<_> =
            results.iter().map(|(_, result)| result.as_ref().unwrap().kind()).collect();
        assert_eq!(kinds, ["success", "invalid_configuration", "fatal_failure"]);
        assert_eq!(results[1].0.target(), "/p/config.py");
    }

    #[tokio::test]
    async fn cancelled_checks_produce_no_outcome() {
        let runner = Arc::new(ScriptedRunner::new(Duration::from_secs(30)));
        let checker = Checker::new(runner.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });
        let results = checker.check_all(vec![spec("/p/a.py"), spec("/p/b.py")], &cancel).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, result)| result.as_ref().unwrap_err().is_cancelled()));
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }
}
