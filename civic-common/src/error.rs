//! Common error types for the civic services

use thiserror::Error;

/// Common result type for civic operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by every civic service
///
/// Each variant maps to exactly one externally visible error kind, so callers
/// can always tell a rejected input apart from a missing record or a failed
/// storage write.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blob storage failure (upload or delete)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or out-of-range input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing or invalid credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credential valid but role insufficient for the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness or referential precondition violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error was raised by a storage layer (database, filesystem, blob store)
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Io(_) | Error::Storage(_))
    }
}
