//! Error types for resource storage.

use blobstate_core::CoreError;
use blobstate_storage::StorageError;
use thiserror::Error;

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors returned by the resource manager.
///
/// Errors from the underlying stores are wrapped with the resource path and
/// the phase that failed (`"write blob"`, `"commit metadata"`, ...).
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource path does not follow the path grammar.
    #[error("invalid resource path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No resource exists at the path, or its content is gone.
    #[error("resource {path} not found")]
    NotFound {
        /// The resource path.
        path: String,
    },

    /// Uploaded content did not hash to the expected SHA-384.
    #[error("resource {path}: hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// The resource path.
        path: String,
        /// Hex digest the caller supplied.
        expected: String,
        /// Hex digest of the uploaded content.
        actual: String,
    },

    /// Uploaded content did not have the expected length.
    #[error("resource {path}: size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The resource path.
        path: String,
        /// Length the caller supplied.
        expected: u64,
        /// Length read before giving up.
        actual: u64,
    },

    /// Concurrent writers kept invalidating the metadata transaction.
    ///
    /// Transient; the caller may retry.
    #[error("resource {path}: state changing too quickly; gave up after {attempts} attempts")]
    ExcessiveContention {
        /// The resource path.
        path: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The blob store failed.
    #[error("resource {path}: cannot {phase}: {source}")]
    Blob {
        /// The resource path.
        path: String,
        /// What was being done.
        phase: &'static str,
        /// Underlying error.
        #[source]
        source: StorageError,
    },

    /// The document store failed.
    #[error("resource {path}: cannot {phase}: {source}")]
    Metadata {
        /// The resource path.
        path: String,
        /// What was being done.
        phase: &'static str,
        /// Underlying error.
        #[source]
        source: CoreError,
    },
}

impl ResourceError {
    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Returns true if the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the operation lost to concurrent writers and may be
    /// retried.
    #[must_use]
    pub fn is_excessive_contention(&self) -> bool {
        matches!(self, Self::ExcessiveContention { .. })
    }

    /// Returns true for content that failed verification.
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::HashMismatch { .. } | Self::SizeMismatch { .. })
    }

    /// Wraps a blob store error, lifting verification failures to their own
    /// variants.
    pub(crate) fn from_blob(path: &str, phase: &'static str, source: StorageError) -> Self {
        match source {
            StorageError::HashMismatch { expected, actual } => Self::HashMismatch {
                path: path.to_string(),
                expected,
                actual,
            },
            StorageError::SizeMismatch { expected, actual } => Self::SizeMismatch {
                path: path.to_string(),
                expected,
                actual,
            },
            source => Self::Blob {
                path: path.to_string(),
                phase,
                source,
            },
        }
    }

    /// Wraps a document store error, lifting exhausted retries to
    /// [`ResourceError::ExcessiveContention`].
    pub(crate) fn from_metadata(path: &str, phase: &'static str, source: CoreError) -> Self {
        match source {
            CoreError::ExcessiveContention { attempts } => Self::ExcessiveContention {
                path: path.to_string(),
                attempts,
            },
            source => Self::Metadata {
                path: path.to_string(),
                phase,
                source,
            },
        }
    }
}
