//! Port traits defining external boundaries.
//!
//! Each trait is a boundary between the checking core and something outside
//! it: the operating system's process table and the host's project model.
//! Implementations live in `src/adapters/`.

pub mod process;
pub mod project;

pub use process::{ProcessOutput, ProcessRunner, RecordedRunError, RunError, RunFuture};
pub use project::{Module, ProjectModel};
