//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use blobstate_core::InMemoryDocumentStore;
use blobstate_resources::{ManagerConfig, PutRequest, ResourceManager};
use blobstate_storage::InMemoryBlobStore;
use rand::Rng;
use std::sync::Arc;

/// Generate random content of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` shared resource paths spread over two series.
pub fn generate_paths(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let series = if i % 2 == 0 { "trusty" } else { "vivid" };
            format!("/blob/s/{series}/file-{i}")
        })
        .collect()
}

/// A manager over fresh in-memory stores.
pub fn memory_manager() -> ResourceManager {
    ResourceManager::new(
        ManagerConfig::default(),
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(InMemoryBlobStore::new()),
    )
}

/// A manager holding one resource of `payload_size` random bytes at each
/// path.
pub fn populated_manager(paths: &[String], payload_size: usize) -> ResourceManager {
    let manager = memory_manager();
    for path in paths {
        manager
            .put(&PutRequest::new(path.as_str()), &random_data(payload_size)[..])
            .expect("Failed to populate benchmark store");
    }
    manager
}
