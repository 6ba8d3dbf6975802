//! Error types for the logger core

use thiserror::Error;

/// Result type for logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or driving a writer pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record could not be encoded
    #[error("failed to encode record: {0}")]
    Encode(String),

    /// Background work was requested outside of a Tokio runtime
    #[error("auto sync requires a running Tokio runtime")]
    NoRuntime,
}
