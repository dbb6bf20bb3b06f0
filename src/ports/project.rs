//! Project model port: where pyright, the interpreter and the project live.

use std::path::{Path, PathBuf};

/// A unit of the project with its own interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Display name.
    pub name: String,
    /// Directory the module lives in.
    pub root: PathBuf,
    /// Interpreter configured for this module, if any.
    pub interpreter: Option<PathBuf>,
}

/// Resolves the inputs a pyright invocation needs.
///
/// Every lookup may come back empty; callers skip the check instead of
/// running pyright with a guessed value.
pub trait ProjectModel: Send + Sync {
    /// Root directory of the project.
    fn project_root(&self) -> Option<&Path>;

    /// The pyright executable to run.
    fn executable(&self) -> Option<PathBuf>;

    /// The project's module, or `None` when there are zero or several.
    fn only_module(&self) -> Option<Module>;

    /// Interpreter used for files of `module`.
    fn interpreter(&self, module: &Module) -> Option<PathBuf>;
}
