//! Live project model backed by settings and the local filesystem.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::ports::project::{Module, ProjectModel};

#[cfg(windows)]
const VENV_PYTHON: &str = "Scripts/python.exe";
#[cfg(not(windows))]
const VENV_PYTHON: &str = "bin/python";

const VENV_DIRS: [&str; 2] = [".venv", "venv"];

#[cfg(windows)]
const LOCAL_PYRIGHT: &str = "node_modules/.bin/pyright.cmd";
#[cfg(not(windows))]
const LOCAL_PYRIGHT: &str = "node_modules/.bin/pyright";

/// Project model that reads settings and looks for tools on disk.
///
/// The executable comes from settings, then a project-local
/// `node_modules/.bin/pyright`, then `PATH`. Interpreters come from the
/// module, then settings, then a `.venv`/`venv` in the module or project
/// root, then `python3`/`python` on `PATH`.
#[derive(Debug, Clone)]
pub struct SettingsProjectModel {
    root: Option<PathBuf>,
    settings: Settings,
}

impl SettingsProjectModel {
    /// Creates a project model rooted at `root`.
    #[must_use]
    pub fn new(root: Option<PathBuf>, settings: Settings) -> Self {
        Self { root, settings }
    }
}

impl ProjectModel for SettingsProjectModel {
    fn project_root(&self) -> Option<&Path> {
        self.root.as_deref().filter(|root| root.is_dir())
    }

    fn executable(&self) -> Option<PathBuf> {
        if let Some(configured) = &self.settings.executable {
            return existing_file(configured);
        }
        self.project_root()
            .and_then(|root| existing_file(&root.join(LOCAL_PYRIGHT)))
            .or_else(|| which::which("pyright").ok())
    }

    fn only_module(&self) -> Option<Module> {
        let root = self.project_root()?;

        match self.settings.modules.as_slice() {
            [] => Some(Module {
                name: root
                    .file_name()
                    .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned()),
                root: root.to_path_buf(),
                interpreter: None,
            }),
            [module] => Some(Module {
                name: module.name.clone(),
                root: module.root.clone().unwrap_or_else(|| root.to_path_buf()),
                interpreter: module.interpreter.clone(),
            }),
            modules => {
                tracing::debug!(count = modules.len(), "project has several modules, none selected");
                None
            }
        }
    }

    fn interpreter(&self, module: &Module) -> Option<PathBuf> {
        if let Some(configured) = module.interpreter.as_ref().or(self.settings.interpreter.as_ref()) {
            return existing_file(configured);
        }

        let roots = std::iter::once(module.root.as_path()).chain(self.project_root());
        roots
            .flat_map(|root| VENV_DIRS.iter().map(move |venv| root.join(venv).join(VENV_PYTHON)))
            .find(|candidate| candidate.is_file())
            .or_else(|| which::which("python3").ok())
            .or_else(|| which::which("python").ok())
    }
}

fn existing_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        tracing::debug!(path = %path.display(), "configured path does not exist");
        None
    }
}
