//! Error types
//!
//! Only structural failures are errors. Everything wrong with the content
//! of a program is reported as a lint finding instead.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a whole analysis run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The input is not valid UTF-8
    #[error("input is not valid UTF-8 (line {line}, byte offset {offset})")]
    Encoding { line: u32, offset: usize },
    /// No line carries a command
    #[error("program contains no commands")]
    EmptyProgram,
}

/// Failure to load a machine profile
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read machine profile {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse machine profile {origin}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("machine profile {origin} is invalid: {reason}")]
    Invalid { origin: String, reason: String },
}
