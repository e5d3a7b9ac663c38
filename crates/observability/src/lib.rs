//! Tracing and logging setup shared by the console binaries.

pub mod tracing;

pub use self::tracing::{LogFormat, init};
