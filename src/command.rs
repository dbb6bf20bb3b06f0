//! Pyright invocations: the immutable [`CommandSpec`] and the builder that
//! turns a configuration snapshot and a target into one.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigurationSnapshot, Locale, SeverityLevel};

/// Switches pyright to machine-readable JSON output.
pub const OUTPUT_JSON_FLAG: &str = "--outputjson";
/// Selects the configuration file or project directory.
pub const PROJECT_FLAG: &str = "--project";
/// Points pyright at the interpreter whose search paths it should use.
pub const PYTHON_PATH_FLAG: &str = "--pythonpath";
/// Minimum diagnostic level to report.
pub const LEVEL_FLAG: &str = "--level";
/// Number of checker threads.
pub const THREADS_FLAG: &str = "--threads";
/// Environment variable pyright reads its message locale from.
pub const LOCALE_ENV_VAR: &str = "LC_ALL";

/// One fully determined pyright invocation.
///
/// Fields are private, so a spec cannot change once made. It comes from
/// [`CommandSpec::build`] or is deserialized back from a cassette or
/// `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    executable: PathBuf,
    arguments: Vec<String>,
    environment: BTreeMap<String, String>,
    working_directory: PathBuf,
}

impl CommandSpec {
    /// Builds the invocation that checks `target` with the given settings.
    ///
    /// Flags are appended in a fixed order and the target always comes last:
    ///
    /// ```text
    /// <executable> --outputjson --project <config|root> --pythonpath <interpreter>
    ///     [--level <LEVEL>] [--threads <N>] <target>
    /// ```
    ///
    /// Optional flags are only emitted when they differ from pyright's
    /// defaults. A non-default locale becomes `LC_ALL` in the environment.
    #[must_use]
    pub fn build(
        config: &ConfigurationSnapshot,
        executable: &Path,
        target: &Path,
        project_root: &Path,
        interpreter: &Path,
    ) -> Self {
        let project_argument = config.configuration_file.as_deref().unwrap_or(project_root);

        let mut arguments = vec![
            OUTPUT_JSON_FLAG.to_string(),
            PROJECT_FLAG.to_string(),
            path_string(project_argument),
            PYTHON_PATH_FLAG.to_string(),
            path_string(interpreter),
        ];
        let mut environment = BTreeMap::new();

        if config.minimum_severity_level != SeverityLevel::Information {
            arguments.push(LEVEL_FLAG.to_string());
            arguments.push(config.minimum_severity_level.name().to_string());
        }

        if config.number_of_threads != 0 {
            arguments.push(THREADS_FLAG.to_string());
            arguments.push(config.number_of_threads.to_string());
        }

        if config.locale != Locale::Default {
            environment.insert(LOCALE_ENV_VAR.to_string(), config.locale.to_string());
        }

        arguments.push(path_string(target));

        Self {
            executable: executable.to_path_buf(),
            arguments,
            environment,
            working_directory: PathBuf::from(path_string(project_root)),
        }
    }

    /// The pyright executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments passed after the executable, in order.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Variables layered over the inherited environment.
    #[must_use]
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Directory the process runs in.
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The checked file, which is always the final argument.
    #[must_use]
    pub fn target(&self) -> &str {
        self.arguments.last().map_or("", String::as_str)
    }

    /// Executable followed by every argument.
    #[must_use]
    pub fn fragments(&self) -> Vec<String> {
        std::iter::once(path_string(&self.executable))
            .chain(self.arguments.iter().cloned())
            .collect()
    }
}

/// Renders the invocation as a POSIX shell line, environment first.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.environment {
            write!(f, "{}={} ", shell_words::quote(name), shell_words::quote(value))?;
        }
        f.write_str(&shell_words::join(self.fragments()))
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
