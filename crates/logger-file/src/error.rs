//! Error types for file-based logging

use proven_logger::ParseLevelError;
use std::io;
use std::path::PathBuf;

/// Result type for file logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while opening files or building writers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to create log directory
    #[error("failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The path that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to open the active log file
    #[error("failed to open log file at {path}: {source}")]
    OpenFile {
        /// The file that failed to open
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Byte size string could not be parsed
    #[error("invalid byte size: {0:?}")]
    InvalidByteSize(String),

    /// Duration string could not be parsed
    #[error("invalid duration {value:?}: {reason}")]
    InvalidDuration {
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Unknown writer target
    #[error("writer target {0:?} invalid, expected stdout, stderr or file")]
    InvalidTarget(String),

    /// Unknown writer mode
    #[error("writer mode {0:?} invalid, expected direct, buffer or batch")]
    InvalidMode(String),

    /// Unknown level name
    #[error(transparent)]
    InvalidLevel(#[from] ParseLevelError),

    /// Error from the logger core
    #[error(transparent)]
    Logger(#[from] proven_logger::Error),
}
