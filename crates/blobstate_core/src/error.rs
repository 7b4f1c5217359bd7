//! Error types for BlobState core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in document stores and the transaction runner.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Byte log error.
    #[error("storage error: {0}")]
    Storage(#[from] blobstate_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A batch was rejected because one of its preconditions did not hold.
    ///
    /// Nothing in the batch was applied. The transaction runner treats this
    /// as contention and rebuilds the batch.
    #[error("transaction aborted: {reason}")]
    Aborted {
        /// Which precondition failed.
        reason: String,
    },

    /// Every attempt allowed by the retry budget was aborted.
    #[error("state changing too quickly; gave up after {attempts} attempts")]
    ExcessiveContention {
        /// Number of attempts made.
        attempts: u32,
    },

    /// Operation not permitted.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// A stored document lacks a field or holds a value of the wrong kind.
    #[error("invalid document {id}: {message}")]
    InvalidDocument {
        /// Document ID.
        id: String,
        /// What is wrong with it.
        message: String,
    },

    /// A journal payload could not be encoded or decoded.
    #[error("encoding error: {message}")]
    Encoding {
        /// Description of the failure.
        message: String,
    },

    /// The journal is corrupted or written by an unknown format.
    #[error("journal corruption: {message}")]
    JournalCorruption {
        /// Description of the corruption.
        message: String,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Stored checksum.
        expected: u32,
        /// Computed checksum.
        actual: u32,
    },

    /// Another process holds the store's directory lock.
    #[error("store locked: another process has exclusive access")]
    StoreLocked,
}

impl CoreError {
    /// Creates an aborted error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Creates a journal corruption error.
    pub fn journal_corruption(message: impl Into<String>) -> Self {
        Self::JournalCorruption {
            message: message.into(),
        }
    }

    /// Returns true if a batch was rejected by a failed precondition.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// Returns true if the runner exhausted its retry budget.
    #[must_use]
    pub fn is_excessive_contention(&self) -> bool {
        matches!(self, Self::ExcessiveContention { .. })
    }
}
