//! Binary entrypoint for the `pyright-bridge` CLI.

use std::process::ExitCode;

use pyright_bridge::Verdict;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Recording is handled in commands::dispatch via PYRIGHT_BRIDGE_RECORD=<dir>.
    match pyright_bridge::run(std::env::args()) {
        Ok(Verdict::Clean) => ExitCode::SUCCESS,
        Ok(Verdict::Failed) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}
