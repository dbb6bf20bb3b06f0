//! Recording session: where a recorded check writes its cassette.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::recorder::CassetteRecorder;

/// File name of the process cassette inside a session directory.
pub const PROCESS_CASSETTE: &str = "process.cassette.yaml";

/// Owns the recorder shared with the recording adapters.
///
/// Cassettes are stored in a timestamped directory under the base directory
/// given to [`RecordingSession::new`].
pub struct RecordingSession {
    /// Recorder for process runs.
    pub process: Arc<Mutex<CassetteRecorder>>,
    /// Output directory containing the cassette files.
    output_dir: PathBuf,
}

impl RecordingSession {
    /// Create a session writing to `<base>/<timestamp>/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory already exists or cannot be created.
    pub fn new(base: &Path) -> Result<Self, String> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let output_dir = base.join(&timestamp);

        if output_dir.exists() {
            return Err(format!("Cassette directory already exists: {}", output_dir.display()));
        }

        std::fs::create_dir_all(&output_dir)
            .map_err(|e| format!("Failed to create cassette directory: {e}"))?;

        let recorder = CassetteRecorder::new(
            output_dir.join(PROCESS_CASSETTE),
            format!("{timestamp}-process"),
            commit_hash(),
        );

        Ok(Self { process: Arc::new(Mutex::new(recorder)), output_dir })
    }

    /// Directory the cassettes are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the cassette files to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if an adapter still holds the recorder or the
    /// cassette cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.process)
            .map_err(|_| "Recording adapter for process still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock for process poisoned: {e}"))?;
        let recorded = recorder.len();
        recorder.finish().map_err(|e| format!("Failed to write process cassette: {e}"))?;
        tracing::info!(recorded, dir = %self.output_dir.display(), "cassette written");
        Ok(self.output_dir)
    }
}

/// The current git commit hash, or "unknown" when unavailable.
fn commit_hash() -> String {
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string());

    hash.unwrap_or_else(|| {
        tracing::warn!("could not get git commit hash, using 'unknown'");
        "unknown".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Cassette;
    use serde_json::json;

    #[test]
    fn session_writes_process_cassette() {
        let base = tempfile::tempdir().unwrap();
        let session = RecordingSession::new(base.path()).unwrap();
        assert!(session.output_dir().exists());

        session.process.lock().unwrap().record("process", "run", json!({}), json!({"Err": "x"}));

        let dir = session.finish().unwrap();
        let cassette = Cassette::load(&dir.join(PROCESS_CASSETTE)).unwrap();
        assert_eq!(cassette.interactions.len(), 1);
    }

    #[test]
    fn finish_fails_while_recorder_is_shared() {
        let base = tempfile::tempdir().unwrap();
        let session = RecordingSession::new(base.path()).unwrap();
        let _held = Arc::clone(&session.process);

        assert!(session.finish().is_err());
    }

    #[test]
    fn commit_hash_is_never_empty() {
        assert!(!commit_hash().is_empty());
    }
}
