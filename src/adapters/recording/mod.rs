//! Recording adapters that capture interactions to cassettes.

pub mod process;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

/// Record a `Result<T, E>` interaction using the Ok/Err JSON convention.
///
/// Read back by the replaying adapters.
///
/// Convention:
/// - `Ok(v)` is serialized as `{"Ok": v}`
/// - `Err(e)` is serialized as `{"Err": e}`
///
/// Values that cannot be serialized are logged and skipped rather than
/// failing the run being recorded.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: Serialize,
    I: Serialize,
{
    let input_json = match serde_json::to_value(input) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, port, method, "skipping unserializable recording input");
            return;
        }
    };

    let output_json = match result {
        Ok(v) => serde_json::to_value(v).map(|inner| serde_json::json!({ "Ok": inner })),
        Err(e) => serde_json::to_value(e).map(|inner| serde_json::json!({ "Err": inner })),
    };
    let output_json = match output_json {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(%error, port, method, "skipping unserializable recording output");
            return;
        }
    };

    match recorder.lock() {
        Ok(mut guard) => guard.record(port, method, input_json, output_json),
        Err(error) => tracing::warn!(%error, "recorder lock poisoned, interaction dropped"),
    }
}
