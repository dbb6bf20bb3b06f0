//! Recording adapter for the `ProcessRunner` port.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::command::CommandSpec;
use crate::ports::process::{ProcessRunner, RecordedRunError, RunError, RunFuture};

/// Records process runs while delegating to an inner implementation.
///
/// Cancelled runs are not recorded; replaying them would have nothing to
/// return.
pub struct RecordingProcessRunner {
    inner: Box<dyn ProcessRunner>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingProcessRunner {
    /// Creates a new recording runner wrapping the given implementation.
    pub fn new(inner: Box<dyn ProcessRunner>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ProcessRunner for RecordingProcessRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> RunFuture<'a> {
        Box::pin(async move {
            let result = self.inner.run(spec, cancel).await;
            if !matches!(result, Err(RunError::Cancelled)) {
                let recorded = result.as_ref().map_err(RecordedRunError::from);
                record_result(&self.recorder, "process", "run", spec, &recorded);
            }
            result
        })
    }
}
