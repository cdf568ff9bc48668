//! Error types for the Windgate limiter.

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for Windgate operations.
#[derive(Error, Debug)]
pub enum WindgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Counter store errors surfaced in fail-closed mode
    #[error("Counter store error: {0}")]
    Store(#[from] StoreError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Windgate operations.
pub type Result<T> = std::result::Result<T, WindgateError>;
