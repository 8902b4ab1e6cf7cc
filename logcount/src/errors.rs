//! Error types for logcount.
//!
//! Every failure a run can end with is a [`CountError`] variant. Precondition
//! failures (no filters, missing file, ...) are never fatal: the run controller
//! turns them into a human-readable reason on the [`RunResult`](crate::RunResult)
//! instead of propagating them.
//!
//! ```rust,ignore
//! match FilterSet::from_patterns(["ERROR", ""]) {
//!     Ok(set) => // count with it,
//!     Err(CountError::InvalidPattern(p)) => // reject the empty filter,
//!     Err(e) => // anything else
//! }
//! ```
use std::path::PathBuf;
use thiserror::Error;

/// Result type for counting operations
pub type CountResult<T> = Result<T, CountError>;

/// Errors that can occur while configuring or running an analysis
#[derive(Error, Debug)]
pub enum CountError {
    #[error("Invalid pattern: {0:?}")]
    InvalidPattern(String),
    #[error("Nothing to do: no filters defined")]
    NoFilters,
    #[error("No file to analyse")]
    NoFile,
    #[error("Selected file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("File is not readable: {0}")]
    NotReadable(PathBuf),
    #[error("Analysis cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid UTF-8 in file {path} at line {line}")]
    EncodingError { path: PathBuf, line: u64 },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CountError {
    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile(path.into())
    }

    pub fn not_readable(path: impl Into<PathBuf>) -> Self {
        Self::NotReadable(path.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, line: u64) -> Self {
        Self::EncodingError {
            path: path.into(),
            line,
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Maps an `io::Error` raised while opening `path` onto the matching variant.
    pub(crate) fn from_open_error(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::not_readable(path),
            _ => Self::IoError(err),
        }
    }
}
