//! Service context bundling settings and port trait objects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::live::process::LiveProcessRunner;
use crate::adapters::live::project::SettingsProjectModel;
use crate::adapters::recording::process::RecordingProcessRunner;
use crate::adapters::replaying::ReplayingProcessRunner;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::check::Checker;
use crate::config::Settings;
use crate::ports::process::ProcessRunner;
use crate::ports::project::ProjectModel;

/// Bundles the settings and ports a command needs.
///
/// Constructors wire up different process runners (live, recording,
/// replaying); the project model always reads the real filesystem.
pub struct ServiceContext {
    /// Settings after file, environment and command-line overrides.
    pub settings: Settings,
    /// Project model resolving executable, modules and interpreters.
    pub project: Box<dyn ProjectModel>,
    /// Process runner for pyright.
    pub runner: Arc<dyn ProcessRunner>,
}

impl ServiceContext {
    /// Creates a context that runs pyright for real.
    #[must_use]
    pub fn live(root: Option<PathBuf>, settings: Settings) -> Self {
        let runner = Arc::new(LiveProcessRunner::from_settings(&settings));
        Self::with_runner(root, settings, runner)
    }

    /// Creates a live context that records every run into a new session
    /// under `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording_at(
        root: Option<PathBuf>,
        settings: Settings,
        base: &Path,
    ) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(base)?;
        let inner = Box::new(LiveProcessRunner::from_settings(&settings));
        let runner = Arc::new(RecordingProcessRunner::new(inner, Arc::clone(&session.process)));
        Ok((Self::with_runner(root, settings, runner), session))
    }

    /// Creates a context answering runs from a recorded cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(root: Option<PathBuf>, settings: Settings, cassette: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(cassette)?;
        let runner = Arc::new(ReplayingProcessRunner::new(CassetteReplayer::new(&cassette)));
        Ok(Self::with_runner(root, settings, runner))
    }

    /// Creates a context around an arbitrary runner.
    #[must_use]
    pub fn with_runner(root: Option<PathBuf>, settings: Settings, runner: Arc<dyn ProcessRunner>) -> Self {
        let project = Box::new(SettingsProjectModel::new(root, settings.clone()));
        Self { settings, project, runner }
    }

    /// A checker sharing this context's runner.
    #[must_use]
    pub fn checker(&self) -> Checker {
        Checker::new(Arc::clone(&self.runner))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::cassette::format::Interaction;
    use crate::command::CommandSpec;
    use crate::config::ConfigurationSnapshot;

    #[tokio::test]
    async fn replaying_context_serves_recorded_run() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CommandSpec::build(
            &ConfigurationSnapshot::default(),
            Path::new("/bin/pyright"),
            Path::new("/p/a.py"),
            Path::new("/p"),
            Path::new("/bin/python3"),
        );
        let cassette = Cassette {
            name: "ctx".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: "process".into(),
                method: "run".into(),
                input: serde_json::to_value(&spec).unwrap(),
                output: json!({"Ok": {"exit_code": 1, "stdout": "{\"summary\":{}}", "stderr": ""}}),
            }],
        };
        let path = dir.path().join("process.cassette.yaml");
        std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();

        let ctx = ServiceContext::replaying(None, Settings::default(), &path).unwrap();
        let outcome = ctx.checker().check(&spec, &CancellationToken::new()).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.stdout(), "{\"summary\":{}}");
    }

    #[test]
    fn replaying_missing_cassette_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ServiceContext::replaying(None, Settings::default(), &dir.path().join("nope"));
        assert!(result.is_err());
    }

    #[test]
    fn live_context_uses_given_root() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ServiceContext::live(Some(dir.path().to_path_buf()), Settings::default());
        assert_eq!(ctx.project.project_root(), Some(dir.path()));
    }
}
