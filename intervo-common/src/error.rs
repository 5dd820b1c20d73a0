//! Common error types for Intervo

use thiserror::Error;

/// Common result type for Intervo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Intervo services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caller is not allowed to access the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Upstream service (AI gateway, TTS, STT) failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Session status transition violates the state machine
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("JSON (de)serialization failed: {}", e))
    }
}
