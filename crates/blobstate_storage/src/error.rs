//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in byte logs and blob stores.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Attempted to read beyond the end of a byte log.
    #[error("read beyond end of log: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// The requested read offset.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The current log size.
        size: u64,
    },

    /// No blob is stored under the given namespace and path.
    #[error("blob not found: {namespace}/{path}")]
    NotFound {
        /// Namespace that was searched.
        namespace: String,
        /// Blob path that was not found.
        path: String,
    },

    /// A namespace or blob path is malformed or escapes its root.
    #[error("invalid blob location: {0}")]
    InvalidPath(String),

    /// Streamed content did not have the expected length.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Length the caller announced.
        expected: u64,
        /// Length actually read (may stop early once `expected` is exceeded).
        actual: u64,
    },

    /// Streamed content did not hash to the expected digest.
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Hex digest the caller announced.
        expected: String,
        /// Hex digest of the content actually read.
        actual: String,
    },

    /// A textual hash could not be parsed.
    #[error("invalid hash: {0}")]
    InvalidHash(String),
}

impl StorageError {
    /// Creates a not-found error.
    pub fn not_found(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NotFound {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath(message.into())
    }

    /// Returns true if the error reports a missing blob.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
