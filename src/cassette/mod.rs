//! Cassette format for recording and replaying process runs.

pub mod format;
pub mod recorder;
pub mod replayer;
pub mod session;
