//! Human-readable reports for failed runs.

use crate::outcome::Outcome;

/// Where pyright crashes should be reported.
pub const PYRIGHT_ISSUES_URL: &str = "https://github.com/microsoft/pyright/issues";

/// Where bad command lines built by this crate should be reported.
pub const BRIDGE_ISSUES_URL: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/issues");

/// Renders the diagnostic printed for a failed check of `file`.
///
/// Returns `None` for a successful outcome.
#[must_use]
pub fn failure(file: &str, outcome: &Outcome) -> Option<String> {
    let (headline, stderr) = match outcome {
        Outcome::Success { .. } => return None,
        Outcome::FatalFailure { stderr, .. } => (
            format!(
                "pyright crashed while checking {file}.\n\
                 Please report this at {PYRIGHT_ISSUES_URL}"
            ),
            stderr,
        ),
        Outcome::InvalidConfiguration { stderr, config_file_path, .. } => (
            format!("pyright could not parse its configuration file {config_file_path}"),
            stderr,
        ),
        Outcome::InvalidInvocation { stderr, .. } => (
            format!(
                "pyright rejected the command line built for {file}.\n\
                 This is a bug in pyright-bridge, not in your project. \
                 Please report it at {BRIDGE_ISSUES_URL}"
            ),
            stderr,
        ),
    };

    Some(with_stderr(headline, stderr))
}

fn with_stderr(headline: String, stderr: &str) -> String {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        headline
    } else {
        let quoted: Vec<String> = stderr.lines().map(|line| format!("  | {line}")).collect();
        format!("{headline}\n{}", quoted.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_renders_nothing() {
        assert!(failure("a.py", &Outcome::Success { stdout: "{}".into() }).is_none());
    }

    #[test]
    fn fatal_failure_links_issue_tracker() {
        let outcome =
            Outcome::FatalFailure { stdout: String::new(), stderr: "Fatal error: heap\nat x\n".into() };

        let text = failure("/p/a.py", &outcome).unwrap();

        assert!(text.contains(PYRIGHT_ISSUES_URL));
        assert!(text.contains("/p/a.py"));
        assert!(text.ends_with("  | Fatal error: heap\n  | at x"));
    }

    #[test]
    fn invalid_configuration_names_the_file() {
        let outcome = Outcome::InvalidConfiguration {
            stdout: String::new(),
            stderr: String::new(),
            config_file_path: "/p/pyrightconfig.json".into(),
        };

        let text = failure("/p/a.py", &outcome).unwrap();

        assert_eq!(text, "pyright could not parse its configuration file /p/pyrightconfig.json");
    }

    #[test]
    fn invalid_invocation_blames_the_bridge() {
        let outcome = Outcome::InvalidInvocation {
            stdout: String::new(),
            stderr: "Unexpected option --nope".into(),
        };

        let text = failure("/p/a.py", &outcome).unwrap();

        assert!(text.contains("bug in pyright-bridge"));
        assert!(text.contains(BRIDGE_ISSUES_URL));
        assert!(BRIDGE_ISSUES_URL.starts_with(env!("CARGO_PKG_REPOSITORY")));
        assert!(!text.contains(PYRIGHT_ISSUES_URL));
    }
}
