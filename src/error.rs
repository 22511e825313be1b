use std::path::PathBuf;

use thiserror::Error;

use crate::exit_codes;

/// Conditions that abort a run before any item is processed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("prerequisite missing: `{program}` was not found on PATH")]
    PrerequisiteMissing { program: String },

    #[error("source unavailable: {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PrerequisiteMissing { .. } => exit_codes::PREREQUISITE_MISSING,
            Self::SourceUnavailable { .. } => exit_codes::SOURCE_UNAVAILABLE,
        }
    }
}

/// Conditions that are caught at the item boundary and counted.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("malformed entry on line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("write failed for {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
