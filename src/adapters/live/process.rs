//! Live process runner using `tokio::process::Command`.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::command::CommandSpec;
use crate::config::Settings;
use crate::ports::process::{ProcessOutput, ProcessRunner, RunError, RunFuture};

const READ_CHUNK: usize = 8192;

/// Runs pyright as a real child process.
#[derive(Debug, Clone, Default)]
pub struct LiveProcessRunner {
    timeout: Option<Duration>,
    max_output_bytes: Option<usize>,
}

impl LiveProcessRunner {
    /// Creates a runner without time or output limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner with the limits from `settings`, where zero means unlimited.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: (settings.timeout_secs > 0).then(|| Duration::from_secs(settings.timeout_secs)),
            max_output_bytes: (settings.max_output_bytes > 0).then_some(settings.max_output_bytes),
        }
    }

    /// Kills the process if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Kills the process if either stream grows past `limit` bytes.
    #[must_use]
    pub fn with_max_output_bytes(mut self, limit: usize) -> Self {
        self.max_output_bytes = Some(limit);
        self
    }

    async fn execute(
        &self,
        spec: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, RunError> {
        if cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }

        let mut command = Command::new(spec.executable());
        command
            .args(spec.arguments())
            .envs(spec.environment())
            .current_dir(spec.working_directory())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so node and anything else pyright starts can be
        // killed with it.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            executable: spec.executable().display().to_string(),
            source,
        })?;
        let pid = child.id();
        tracing::debug!(pid, command = %spec, "spawned pyright");

        let finished = tokio::select! {
            result = drain(&mut child, self.max_output_bytes) => Ok(result),
            () = cancel.cancelled() => Err(RunError::Cancelled),
            () = deadline(self.timeout) => Err(RunError::TimedOut(self.timeout.unwrap_or_default())),
        };

        match finished {
            Ok(Ok(output)) => {
                tracing::debug!(exit_code = output.exit_code, file = spec.target(), "pyright exited");
                Ok(output)
            }
            Ok(Err(error)) | Err(error) => {
                tracing::warn!(%error, file = spec.target(), "terminating pyright");
                terminate(&mut child, pid).await;
                Err(error)
            }
        }
    }
}

impl ProcessRunner for LiveProcessRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec, cancel: &'a CancellationToken) -> RunFuture<'a> {
        Box::pin(self.execute(spec, cancel))
    }
}

/// Reads both pipes to the end, then reaps the process.
async fn drain(child: &mut Child, limit: Option<usize>) -> Result<ProcessOutput, RunError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr) =
        tokio::try_join!(read_stream(stdout, limit, "stdout"), read_stream(stderr, limit, "stderr"))?;
    let status = child.wait().await?;

    Ok(ProcessOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}

async fn read_stream<R>(
    reader: Option<R>,
    limit: Option<usize>,
    stream: &'static str,
) -> Result<Vec<u8>, RunError>
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if let Some(limit) = limit {
            if buf.len() + n > limit {
                return Err(RunError::OutputLimitExceeded { stream, limit });
            }
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf)
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Kills the process group led by `pid`, then kills and reaps the child
/// itself so nothing is left running.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            kill_group(pid);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(error) = child.kill().await {
        tracing::warn!(%error, "failed to kill pyright");
    }
}

#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    // ESRCH just means the whole group is already gone.
    if let Err(error) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        tracing::debug!(%error, pid, "process group not signalled");
    }
}
