//! Error types for lexikv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LexiError
pub type Result<T> = std::result::Result<T, LexiError>;

/// Boxed error coming out of a backend implementation
pub type BackendFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for lexikv operations
#[derive(Debug, Error)]
pub enum LexiError {
    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Key not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    #[error("Decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Backend error: {0}")]
    Backend(#[source] BackendFailure),

    #[error("Snapshot corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Store is not open: {0}")]
    NotOpen(String),

    #[error("Task queue is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LexiError {
    /// Wrap an arbitrary backend failure
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BackendFailure>,
    {
        LexiError::Backend(err.into())
    }

    /// True for the `NotFound` variant
    pub fn is_not_found(&self) -> bool {
        matches!(self, LexiError::NotFound)
    }
}

impl From<std::io::Error> for LexiError {
    fn from(err: std::io::Error) -> Self {
        LexiError::Backend(Box::new(err))
    }
}

impl From<bincode::Error> for LexiError {
    fn from(err: bincode::Error) -> Self {
        LexiError::Backend(err)
    }
}
