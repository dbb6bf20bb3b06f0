//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV_VAR: &str = "PYRIGHT_BRIDGE_LOG";

/// Installs a stderr subscriber; stdout is reserved for pyright's report.
///
/// `PYRIGHT_BRIDGE_LOG` wins when set. Otherwise each `-v` raises the level
/// from `warn` to `info` to `debug`. Later calls are no-ops.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    // A subscriber may already be installed, e.g. when run() is called twice.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "pyright_bridge=warn",
        1 => "pyright_bridge=info",
        _ => "pyright_bridge=debug",
    }
}
