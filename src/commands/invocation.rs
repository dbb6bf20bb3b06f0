//! `pyright-bridge command` command.

use std::path::Path;

use super::Verdict;
use crate::command::CommandSpec;
use crate::context::ServiceContext;
use crate::target;

/// Execute the `command` command: print the invocation checking `file`.
///
/// # Errors
///
/// Returns an error string if no invocation can be built for `file`.
pub fn run_with_context(ctx: &ServiceContext, file: &Path, json: bool) -> Result<Verdict, String> {
    let spec = target::for_file(ctx.project.as_ref(), &ctx.settings.snapshot(), file)
        .ok_or_else(|| format!("Cannot build a pyright command for {}", file.display()))?;
    println!("{}", render(&spec, json)?);
    Ok(Verdict::Clean)
}

fn render(spec: &CommandSpec, json: bool) -> Result<String, String> {
    if json {
        serde_json::to_string_pretty(spec).map_err(|e| format!("Failed to serialize command: {e}"))
    } else {
        Ok(spec.to_string())
    }
}
