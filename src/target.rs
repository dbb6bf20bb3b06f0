//! Resolving a file into everything a pyright invocation needs.
//!
//! Any missing piece means no command: the file is skipped rather than
//! checked with a guessed executable or interpreter.

use std::path::{Path, PathBuf};

use crate::command::CommandSpec;
use crate::config::ConfigurationSnapshot;
use crate::ports::project::{Module, ProjectModel};

/// The file, interpreter and project that identify one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// File to check.
    pub file: PathBuf,
    /// Interpreter of the module owning the file.
    pub interpreter: PathBuf,
    /// Project scope for pyright and the process working directory.
    pub project_root: PathBuf,
}

impl TargetDescriptor {
    /// Builds the invocation checking this target with `executable`.
    #[must_use]
    pub fn command(&self, config: &ConfigurationSnapshot, executable: &Path) -> CommandSpec {
        CommandSpec::build(config, executable, &self.file, &self.project_root, &self.interpreter)
    }
}

/// Builds the command checking `file`, using the project's only module.
///
/// Returns `None` when the project has zero or several modules, or when
/// [`for_module`] would.
#[must_use]
pub fn for_file(
    project: &dyn ProjectModel,
    config: &ConfigurationSnapshot,
    file: &Path,
) -> Option<CommandSpec> {
    let Some(module) = project.only_module() else {
        tracing::debug!(file = %file.display(), "no single module to check file against");
        return None;
    };
    for_module(project, config, &module, file)
}

/// Builds the command checking `file` as part of `module`.
///
/// Returns `None` when the file does not exist or the project root,
/// executable or interpreter cannot be resolved.
#[must_use]
pub fn for_module(
    project: &dyn ProjectModel,
    config: &ConfigurationSnapshot,
    module: &Module,
    file: &Path,
) -> Option<CommandSpec> {
    let (executable, target) = resolve(project, module, file)?;
    Some(target.command(config, &executable))
}

/// Resolves the executable and target descriptor for `file`.
#[must_use]
pub fn resolve(
    project: &dyn ProjectModel,
    module: &Module,
    file: &Path,
) -> Option<(PathBuf, TargetDescriptor)> {
    let file = existing_path(file)?;
    let project_root = missing(project.project_root().map(Path::to_path_buf), "project root")?;
    let executable = missing(project.executable(), "pyright executable")?;
    let interpreter = missing(project.interpreter(module), "interpreter")?;

    Some((executable, TargetDescriptor { file, interpreter, project_root }))
}

fn existing_path(file: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(file).ok()?;
    if absolute.exists() {
        Some(absolute)
    } else {
        tracing::debug!(file = %absolute.display(), "file to check does not exist");
        None
    }
}

fn missing<T>(value: Option<T>, what: &'static str) -> Option<T> {
    if value.is_none() {
        tracing::debug!(what, "cannot build pyright command");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProject {
        root: Option<PathBuf>,
        executable: Option<PathBuf>,
        modules: Vec<Module>,
        interpreter: Option<PathBuf>,
    }

    impl ProjectModel for FixedProject {
        fn project_root(&self) -> Option<&Path> {
            self.root.as_deref()
        }

        fn executable(&self) -> Option<PathBuf> {
            self.executable.clone()
        }

        fn only_module(&self) -> Option<Module> {
            match self.modules.as_slice() {
                [module] => Some(module.clone()),
                _ => None,
            }
        }

        fn interpreter(&self, module: &Module) -> Option<PathBuf> {
            module.interpreter.clone().or_else(|| self.interpreter.clone())
        }
    }

    fn project(root: &Path) -> FixedProject {
        FixedProject {
            root: Some(root.to_path_buf()),
            executable: Some(PathBuf::from("/opt/pyright/bin/pyright")),
            modules: vec![Module { name: "app".into(), root: root.to_path_buf(), interpreter: None }],
            interpreter: Some(PathBuf::from("/opt/python/bin/python3")),
        }
    }

    fn source_file(dir: &Path) -> PathBuf {
        let file = dir.join("main.py");
        std::fs::write(&file, "x: int = 1\n").unwrap();
        file
    }

    #[test]
    fn builds_command_when_everything_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(dir.path());

        let spec = for_file(&project(dir.path()), &ConfigurationSnapshot::default(), &file).unwrap();

        assert_eq!(spec.executable(), Path::new("/opt/pyright/bin/pyright"));
        assert_eq!(spec.target(), file.to_string_lossy());
        assert_eq!(spec.working_directory(), dir.path());
        assert!(spec.arguments().windows(2).any(|w| w == ["--pythonpath", "/opt/python/bin/python3"]));
    }

    #[test]
    fn module_interpreter_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(dir.path());
        let mut project = project(dir.path());
        project.modules[0].interpreter = Some(PathBuf::from("/venvs/app/bin/python"));

        let spec = for_file(&project, &ConfigurationSnapshot::default(), &file).unwrap();

        assert!(spec.arguments().windows(2).any(|w| w == ["--pythonpath", "/venvs/app/bin/python"]));
    }

    #[test]
    fn several_modules_yield_no_command() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(dir.path());
        let mut project = project(dir.path());
        let second = project.modules[0].clone();
        project.modules.push(second);

        assert!(for_file(&project, &ConfigurationSnapshot::default(), &file).is_none());
    }

    #[test]
    fn missing_file_yields_no_command() {
        let dir = tempfile::tempdir().unwrap();

        let result = for_file(
            &project(dir.path()),
            &ConfigurationSnapshot::default(),
            &dir.path().join("gone.py"),
        );

        assert!(result.is_none());
    }

    #[test]
    fn each_missing_input_yields_no_command() {
        let dir = tempfile::tempdir().unwrap();
        let file = source_file(dir.path());
        let config = ConfigurationSnapshot::default();

        let mut no_root = project(dir.path());
        no_root.root = None;
        assert!(for_file(&no_root, &config, &file).is_none());

        let mut no_executable = project(dir.path());
        no_executable.executable = None;
        assert!(for_file(&no_executable, &config, &file).is_none());

        let mut no_interpreter = project(dir.path());
        no_interpreter.interpreter = None;
        assert!(for_file(&no_interpreter, &config, &file).is_none());
    }
}
