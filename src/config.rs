//! Settings loading and the read-only snapshot handed to the command builder.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings file looked up in the project root when none is given explicitly.
pub const SETTINGS_FILE_NAME: &str = ".pyright-bridge.yaml";

/// Overrides the pyright executable.
pub const EXECUTABLE_ENV_VAR: &str = "PYRIGHT_BRIDGE_EXECUTABLE";
/// Overrides the interpreter passed via `--pythonpath`.
pub const INTERPRETER_ENV_VAR: &str = "PYRIGHT_BRIDGE_INTERPRETER";
/// Overrides the pyright configuration file.
pub const CONFIG_FILE_ENV_VAR: &str = "PYRIGHT_BRIDGE_CONFIG";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024 * 1024;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The settings file is not valid YAML for [`Settings`].
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// A value given on the command line or in the environment is invalid.
    #[error("invalid value {value:?} for {name}")]
    InvalidValue {
        /// Name of the setting.
        name: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Minimum diagnostic severity pyright should report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warning,
    /// Everything; pyright's own default.
    #[default]
    Information,
}

impl SeverityLevel {
    /// The upper-case name passed after `--level`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Information => "INFORMATION",
        }
    }
}

impl FromStr for SeverityLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "information" | "info" => Ok(Self::Information),
            _ => Err(ConfigError::InvalidValue { name: "level", value: s.to_string() }),
        }
    }
}

/// Locale for pyright's messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum Locale {
    /// Leave the inherited locale alone.
    #[default]
    Default,
    En,
    Cs,
    Da,
    De,
    Es,
    Fr,
    It,
    Ja,
    Ko,
    Pl,
    PtBr,
    Ru,
    Tr,
    ZhCn,
    ZhTw,
}

impl Locale {
    const ALL: [Self; 16] = [
        Self::Default,
        Self::En,
        Self::Cs,
        Self::Da,
        Self::De,
        Self::Es,
        Self::Fr,
        Self::It,
        Self::Ja,
        Self::Ko,
        Self::Pl,
        Self::PtBr,
        Self::Ru,
        Self::Tr,
        Self::ZhCn,
        Self::ZhTw,
    ];

    /// The tag written into `LC_ALL`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::En => "en",
            Self::Cs => "cs",
            Self::Da => "da",
            Self::De => "de",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::It => "it",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Pl => "pl",
            Self::PtBr => "pt-br",
            Self::Ru => "ru",
            Self::Tr => "tr",
            Self::ZhCn => "zh-cn",
            Self::ZhTw => "zh-tw",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|locale| locale.as_str() == wanted)
            .ok_or_else(|| ConfigError::InvalidValue { name: "locale", value: s.to_string() })
    }
}

/// Read-only view of the settings that shape the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSnapshot {
    /// Explicit pyright configuration file; the project root is used when absent.
    pub configuration_file: Option<PathBuf>,
    /// Emitted as `--level` unless it is [`SeverityLevel::Information`].
    pub minimum_severity_level: SeverityLevel,
    /// Emitted as `--threads` unless zero.
    pub number_of_threads: u32,
    /// Exported as `LC_ALL` unless [`Locale::Default`].
    pub locale: Locale,
}

/// A module of the project with its own interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSettings {
    /// Display name.
    pub name: String,
    /// Module root, relative to the project root unless absolute.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Interpreter for this module.
    #[serde(default)]
    pub interpreter: Option<PathBuf>,
}

/// Everything read from the settings file, environment and command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Pyright executable.
    pub executable: Option<PathBuf>,
    /// Project-wide interpreter, used when a module has none.
    pub interpreter: Option<PathBuf>,
    /// Pyright configuration file passed via `--project`.
    pub configuration_file: Option<PathBuf>,
    /// See [`ConfigurationSnapshot::minimum_severity_level`].
    pub minimum_severity_level: SeverityLevel,
    /// See [`ConfigurationSnapshot::number_of_threads`].
    pub number_of_threads: u32,
    /// See [`ConfigurationSnapshot::locale`].
    pub locale: Locale,
    /// Project modules; an empty list means the root is the only module.
    pub modules: Vec<ModuleSettings>,
    /// Seconds before a run is killed; zero disables the limit.
    pub timeout_secs: u64,
    /// Cap on each captured stream; zero disables the cap.
    pub max_output_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executable: None,
            interpreter: None,
            configuration_file: None,
            minimum_severity_level: SeverityLevel::default(),
            number_of_threads: 0,
            locale: Locale::default(),
            modules: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl Settings {
    /// Loads settings for `project_root`.
    ///
    /// Reads `explicit` when given, otherwise [`SETTINGS_FILE_NAME`] in the
    /// project root if it exists. Environment overrides are applied on top and
    /// relative paths are resolved against the project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.map_or_else(|| project_root.join(SETTINGS_FILE_NAME), Path::to_path_buf);

        let mut settings = if explicit.is_some() || path.is_file() {
            Self::from_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Self::default()
        };

        settings.apply_env(|name| std::env::var(name).ok());
        settings.resolve_relative_to(project_root);
        Ok(settings)
    }

    /// Parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Applies `PYRIGHT_BRIDGE_*` overrides looked up through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty()).map(PathBuf::from);

        if let Some(executable) = non_empty(EXECUTABLE_ENV_VAR) {
            self.executable = Some(executable);
        }
        if let Some(interpreter) = non_empty(INTERPRETER_ENV_VAR) {
            self.interpreter = Some(interpreter);
        }
        if let Some(configuration_file) = non_empty(CONFIG_FILE_ENV_VAR) {
            self.configuration_file = Some(configuration_file);
        }
    }

    /// Makes every configured path absolute against `project_root`.
    pub fn resolve_relative_to(&mut self, project_root: &Path) {
        let absolutize = |path: &mut Option<PathBuf>| {
            if let Some(p) = path.as_mut() {
                if p.is_relative() {
                    *p = project_root.join(&*p);
                }
            }
        };

        absolutize(&mut self.executable);
        absolutize(&mut self.interpreter);
        absolutize(&mut self.configuration_file);
        for module in &mut self.modules {
            absolutize(&mut module.root);
            absolutize(&mut module.interpreter);
        }
    }

    /// The subset of settings that shapes the command line.
    #[must_use]
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        ConfigurationSnapshot {
            configuration_file: self.configuration_file.clone(),
            minimum_severity_level: self.minimum_severity_level,
            number_of_threads: self.number_of_threads,
            locale: self.locale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pyright_defaults() {
        let settings = Settings::default();
        let snapshot = settings.snapshot();

        assert_eq!(snapshot, ConfigurationSnapshot::default());
        assert_eq!(snapshot.minimum_severity_level, SeverityLevel::Information);
        assert_eq!(snapshot.locale, Locale::Default);
        assert_eq!(settings.timeout_secs, 120);
    }

    #[test]
    fn parses_yaml_settings() {
        let yaml = r"
executable: node_modules/.bin/pyright
configuration_file: /etc/pyrightconfig.json
minimum_severity_level: warning
number_of_threads: 3
locale: zh-tw
modules:
  - name: api
    root: services/api
    interpreter: services/api/.venv/bin/python
";
        let mut settings: Settings = serde_yaml::from_str(yaml).unwrap();
        settings.resolve_relative_to(Path::new("/repo"));

        assert_eq!(settings.executable, Some(PathBuf::from("/repo/node_modules/.bin/pyright")));
        assert_eq!(settings.configuration_file, Some(PathBuf::from("/etc/pyrightconfig.json")));
        assert_eq!(settings.minimum_severity_level, SeverityLevel::Warning);
        assert_eq!(settings.number_of_threads, 3);
        assert_eq!(settings.locale, Locale::ZhTw);
        assert_eq!(settings.modules[0].root, Some(PathBuf::from("/repo/services/api")));
        assert_eq!(settings.timeout_secs, 120);
    }

    #[test]
    fn rejects_unknown_keys() {
        let result: Result<Settings, _> = serde_yaml::from_str("threads: 2\n");
        assert!(result.is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut settings =
            Settings { executable: Some(PathBuf::from("/a/pyright")), ..Settings::default() };
        settings.apply_env(|name| match name {
            EXECUTABLE_ENV_VAR => Some("/b/pyright".into()),
            INTERPRETER_ENV_VAR => Some(String::new()),
            _ => None,
        });

        assert_eq!(settings.executable, Some(PathBuf::from("/b/pyright")));
        assert_eq!(settings.interpreter, None);
    }

    #[test]
    fn load_reads_settings_file_from_project_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE_NAME), "number_of_threads: 6\n").unwrap();

        let settings = Settings::load(dir.path(), None).unwrap();
        assert_eq!(settings.number_of_threads, 6);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path(), None).unwrap();
        assert_eq!(settings.number_of_threads, 0);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Settings::load(dir.path(), Some(&dir.path().join("nope.yaml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn parses_level_and_locale_strings() {
        assert_eq!("ERROR".parse::<SeverityLevel>().unwrap(), SeverityLevel::Error);
        assert_eq!("info".parse::<SeverityLevel>().unwrap(), SeverityLevel::Information);
        assert!("loud".parse::<SeverityLevel>().is_err());
        assert_eq!("pt_BR".parse::<Locale>().unwrap(), Locale::PtBr);
        assert_eq!("default".parse::<Locale>().unwrap(), Locale::Default);
        assert!("xx".parse::<Locale>().is_err());
    }
}
