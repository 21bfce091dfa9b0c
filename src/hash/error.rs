// Centralized error handling module
// Error types for hashing, hex parsing and job control

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read a sequence of hexadecimal digit pairs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexFormatError {
    #[error("The hex value has an odd number of characters ({len}).")]
    OddLength { len: usize },

    #[error("The character '{ch}' at position {index} is not a hexadecimal digit.")]
    InvalidCharacter { ch: char, index: usize },
}

/// Main error type for the hash utility
/// Provides context-rich error messages with file paths and operations
#[derive(Debug, Error)]
pub enum HashUtilityError {
    /// File system errors with context
    #[error("File not found: {}\nSuggestion: Check that the file path is correct and the file exists", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Permission denied while {operation} file: {}\nSuggestion: Check file permissions or run with appropriate privileges", path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("{}\nSuggestion: Check file permissions and disk space", describe_io(path, operation, source))]
    IoError {
        path: Option<PathBuf>,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Hash computation errors
    #[error("Unsupported hash algorithm: {algorithm}\nSuggestion: Use --list to see available algorithms")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Failed to compute {algorithm} hash for {}: {reason}\nSuggestion: Check that the file is readable and not corrupted", path.display())]
    HashComputationFailed {
        path: PathBuf,
        algorithm: String,
        reason: String,
    },

    /// Job control errors
    #[error("A hashing job is already running\nSuggestion: Wait for it to finish or cancel it first")]
    JobInProgress,

    #[error("A hashing job must be started from within a Tokio runtime")]
    NoRuntime,

    /// Settings errors
    #[error("Failed to write settings {}: {reason}\nSuggestion: Check disk space and write permissions", path.display())]
    SettingsWriteError { path: PathBuf, reason: String },
}

fn describe_io(path: &Option<PathBuf>, operation: &str, source: &io::Error) -> String {
    match path {
        Some(p) => format!("I/O error while {} file {}: {}", operation, p.display(), source),
        None => format!("I/O error while {}: {}", operation, source),
    }
}

impl HashUtilityError {
    /// Create an error from an io::Error with context about the operation and optional path
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(path)) => HashUtilityError::FileNotFound { path },
            (io::ErrorKind::PermissionDenied, Some(path)) => HashUtilityError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            (_, path) => HashUtilityError::IoError {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// The first line of the message, without the suggestion
    pub fn summary(&self) -> String {
        let message = self.to_string();
        message.lines().next().unwrap_or_default().to_string()
    }
}
