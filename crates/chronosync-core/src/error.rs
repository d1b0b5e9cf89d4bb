//! Error types for chronosync-core

use thiserror::Error;

/// Result type alias for chronosync operations
pub type Result<T> = std::result::Result<T, ChronoError>;

/// ChronoSync error types
#[derive(Error, Debug)]
pub enum ChronoError {
    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Encryption unavailable: {0}")]
    EncryptionUnavailable(String),

    #[error("Invalid sync code format: expected three segments separated by '.'")]
    MalformedCode,

    #[error("Invalid sync code encoding: {0}")]
    InvalidEncoding(String),

    #[error("Could not decrypt - check your sync code and password")]
    AuthenticationFailed,

    #[error("Decoded snapshot is incomplete: {0}")]
    IncompleteSnapshot(String),

    #[error("Not logged in - log in first")]
    NotLoggedIn,

    #[error("User name must not be empty")]
    InvalidUserName,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("Tag already exists: {0}")]
    TagExists(String),

    #[error("Tag is still assigned to one or more tasks: {0}")]
    TagInUse(String),

    #[error("Invalid tag name")]
    InvalidTagName,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
