//! `pyright-bridge classify` command.

use std::path::Path;

use super::Verdict;
use crate::outcome::{classify, Outcome};

/// Execute the `classify` command: classify captured output and print the
/// outcome as JSON.
///
/// A missing capture file argument stands for an empty stream.
///
/// # Errors
///
/// Returns an error string if a capture file cannot be read or the output
/// cannot be classified.
pub fn run(exit_code: i32, stdout: Option<&Path>, stderr: Option<&Path>) -> Result<Verdict, String> {
    let outcome = classify_captured(exit_code, stdout, stderr)?;
    let json = serde_json::to_string_pretty(&outcome)
        .map_err(|e| format!("Failed to serialize outcome: {e}"))?;
    println!("{json}");
    Ok(Verdict::from_successes(std::iter::once(outcome.is_success())))
}

fn classify_captured(
    exit_code: i32,
    stdout: Option<&Path>,
    stderr: Option<&Path>,
) -> Result<Outcome, String> {
    let stdout = read_capture(stdout)?;
    let stderr = read_capture(stderr)?;
    classify(exit_code, &stdout, &stderr).map_err(|e| e.to_string())
}

fn read_capture(path: Option<&Path>) -> Result<String, String> {
    path.map_or_else(
        || Ok(String::new()),
        |path| {
            std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_captures_are_empty_success() {
        let outcome = classify_captured(0, None, None).unwrap();
        assert_eq!(outcome, Outcome::Success { stdout: String::new() });
    }

    #[test]
    fn reads_captured_streams() {
        let dir = tempfile::tempdir().unwrap();
        let stdout = dir.path().join("out.json");
        let stderr = dir.path().join("err.txt");
        std::fs::write(&stdout, "{}").unwrap();
        std::fs::write(&stderr, "Config file \"/p/pyrightconfig.json\" could not be parsed.\n").unwrap();

        let outcome = classify_captured(1, Some(&stdout), Some(&stderr)).unwrap();

        assert!(matches!(
            outcome,
            Outcome::InvalidConfiguration { ref config_file_path, .. }
                if config_file_path == "/p/pyrightconfig.json"
        ));
    }

    #[test]
    fn unreadable_capture_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = classify_captured(0, Some(&dir.path().join("nope")), None).unwrap_err();
        assert!(error.contains("nope"));
    }

    #[test]
    fn failure_outcome_fails_the_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let stderr = dir.path().join("err.txt");
        std::fs::write(&stderr, "Fatal error: out of memory").unwrap();

        assert_eq!(run(134, None, Some(&stderr)), Ok(Verdict::Failed));
    }
}
