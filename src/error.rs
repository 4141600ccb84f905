//! Unified error types for Pacer-Oxide

use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Pacer-Oxide
///
/// A reached quota is not an error: admission checks report it as `Ok(false)`.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid bounds or limits detected at construction time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The persisted counter store could not be read or written
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    /// The input dispatch collaborator rejected a call
    #[error("Input dispatch error: {0}")]
    Input(String),

    /// An abort was requested between two discrete steps
    #[error("Operation aborted")]
    Aborted,

    /// Timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new store unavailable error
    pub fn store_unavailable<S: Into<String>>(msg: S) -> Self {
        Error::StoreUnavailable(msg.into())
    }

    /// Create a new input dispatch error
    pub fn input<S: Into<String>>(msg: S) -> Self {
        Error::Input(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether a caller-level retry with backoff makes sense
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Input(_) | Error::Timeout(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}
