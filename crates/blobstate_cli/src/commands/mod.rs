//! CLI command implementations.

pub mod delete;
pub mod get;
pub mod list;
pub mod put;

use blobstate_core::FileDocumentStore;
use blobstate_resources::{ManagerConfig, ResourceManager};
use blobstate_storage::FileBlobStore;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Subdirectory holding the metadata journal.
pub const METADATA_DIR: &str = "metadata";

/// Subdirectory holding blob content.
pub const BLOBS_DIR: &str = "blobs";

/// Opens the resource store in `path`, creating it if needed.
pub fn open_manager(
    path: &Path,
    namespace: &str,
) -> Result<ResourceManager, Box<dyn std::error::Error>> {
    let docs = FileDocumentStore::open(&path.join(METADATA_DIR))?;
    let blobs = FileBlobStore::open(path.join(BLOBS_DIR))?;
    debug!(path = %path.display(), namespace, "opened resource store");
    Ok(ResourceManager::new(
        ManagerConfig::new(namespace),
        Arc::new(docs),
        Arc::new(blobs),
    ))
}
