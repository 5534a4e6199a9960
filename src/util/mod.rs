//! Shared filesystem and process-invocation helpers.

pub mod fs;
pub mod process;
