//! Loglift CLI - batch driver for the log call normalization engine
//!
//! Reads JSON-serialized compilation units, rewrites them in parallel and
//! writes rendered Java source or JSON back out.

pub mod driver;

// Re-export commonly used types for convenience
pub use driver::{BatchReport, DriverOptions, EmitFormat, FileReport, FileStatus, UnitInput};
