//! Error types for rstore-core
//!
//! Provides a unified error type shared by all storage backends.

use thiserror::Error;

/// Result type alias for rstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for rstore operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential unreadable or unparseable
    #[error("Credential error: {0}")]
    Credential(String),

    /// Dial, authentication, session or channel failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Metadata query failure other than absence
    #[error("Stat failed: {0}")]
    Stat(String),

    /// Listing or removal failure during a delete
    #[error("Delete failed: {0}")]
    Delete(String),

    /// Traversal failure during a walk
    #[error("Walk failed: {0}")]
    Walk(String),

    /// Remote object could not be opened for reading
    #[error("Open failed: {0}")]
    Open(String),

    /// Remote object could not be created
    #[error("Create failed: {0}")]
    Create(String),

    /// Byte transfer fault while streaming
    #[error("Copy failed: {0}")]
    Copy(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the remote entry is absent
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
