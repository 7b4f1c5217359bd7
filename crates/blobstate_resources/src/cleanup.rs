//! Compensating blob removals.
//!
//! Blob writes and metadata commits cannot share one atomic unit, so once
//! the commit outcome is known the manager removes whichever blob ended up
//! unreferenced. These removals are best effort: a failure is logged and
//! leaves an orphaned blob behind, never a failed operation.

use blobstate_storage::BlobStore;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Compensation {
    /// The commit failed; the blob written for it is referenced by nothing.
    DiscardUncommitted { blob_path: String },
    /// The commit replaced a record; its previous blob is no longer live.
    RemoveSuperseded { blob_path: String },
}

impl Compensation {
    fn blob_path(&self) -> &str {
        match self {
            Self::DiscardUncommitted { blob_path } | Self::RemoveSuperseded { blob_path } => {
                blob_path
            }
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::DiscardUncommitted { .. } => "uncommitted",
            Self::RemoveSuperseded { .. } => "superseded",
        }
    }

    /// Removes the blob. Returns false if the removal failed.
    pub fn run(&self, blobs: &dyn BlobStore, namespace: &str, resource: &str) -> bool {
        let blob_path = self.blob_path();
        match blobs.remove(namespace, blob_path) {
            Ok(existed) => {
                debug!(
                    resource,
                    blob_path,
                    existed,
                    kind = self.describe(),
                    "removed blob"
                );
                true
            }
            Err(e) => {
                warn!(
                    resource,
                    blob_path,
                    kind = self.describe(),
                    error = %e,
                    "failed to remove blob; it is now orphaned"
                );
                false
            }
        }
    }
}
