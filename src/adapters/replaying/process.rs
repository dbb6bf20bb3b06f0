//! Replaying adapter for the `ProcessRunner` port.

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use crate::cassette::format::Interaction;
use crate::cassette::replayer::CassetteReplayer;
use crate::command::CommandSpec;
use crate::ports::process::{ProcessOutput, ProcessRunner, RecordedRunError, RunError, RunFuture};

/// Replays recorded process results from a cassette.
///
/// A run is answered by the first unconsumed recording of the same
/// invocation, so concurrent checks replay correctly whatever order they
/// finish in. An invocation that was never recorded is an error.
pub struct ReplayingProcessRunner {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingProcessRunner {
    /// Creates a new replaying runner from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn replay(&self, spec: &CommandSpec) -> Result<ProcessOutput, RunError> {
        let input = serde_json::to_value(spec).map_err(|e| RunError::Replay(e.to_string()))?;
        let interaction = {
            let mut replayer =
                self.replayer.lock().map_err(|e| RunError::Replay(format!("replayer lock poisoned: {e}")))?;
            replayer.take_matching("process", "run", &input)
        };
        let Some(interaction) = interaction else {
            return Err(RunError::Replay(format!("no recording for `{spec}`")));
        };
        decode(&interaction)
    }
}

fn decode(interaction: &Interaction) -> Result<ProcessOutput, RunError> {
    let output = &interaction.output;
    if let Some(err) = output.get("Err") {
        // Older cassettes hold the error message only.
        if let Some(message) = err.as_str() {
            return Err(RunError::Replay(message.to_string()));
        }
        let recorded: RecordedRunError = serde_json::from_value(err.clone()).map_err(|e| {
            RunError::Replay(format!("recorded error seq={} is malformed: {e}", interaction.seq))
        })?;
        return Err(recorded.into());
    }
    let value = output.get("Ok").unwrap_or(output);
    serde_json::from_value(value.clone()).map_err(|e| {
        RunError::Replay(format!("recorded output seq={} is malformed: {e}", interaction.seq))
    })
}

impl ProcessRunner for ReplayingProcessRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> RunFuture<'a> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            self.replay(spec)
        })
    }
}
