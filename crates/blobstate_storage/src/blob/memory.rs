//! In-memory blob store.

use super::{
    copy_verified, validate_namespace, validate_path, BlobInfo, BlobReader, BlobStore,
    PutExpectations,
};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// Shared, immutable blob bytes handed out to readers.
#[derive(Debug, Clone)]
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A blob store held in memory.
///
/// Readers share the stored bytes, so a blob removed or replaced while a
/// reader is open stays readable through that reader.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<(String, String), Arc<Vec<u8>>>>,
}

impl InMemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of blobs across all namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Returns true if a blob exists at the location.
    #[must_use]
    pub fn contains(&self, namespace: &str, path: &str) -> bool {
        self.blobs
            .read()
            .contains_key(&(namespace.to_string(), path.to_string()))
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(
        &self,
        namespace: &str,
        path: &str,
        content: &mut dyn Read,
        expect: &PutExpectations,
    ) -> StorageResult<BlobInfo> {
        validate_namespace(namespace)?;
        validate_path(path)?;

        let mut data = Vec::new();
        let info = copy_verified(content, &mut data, expect)?;
        self.blobs
            .write()
            .insert((namespace.to_string(), path.to_string()), Arc::new(data));
        Ok(info)
    }

    fn get(&self, namespace: &str, path: &str) -> StorageResult<BlobReader> {
        validate_namespace(namespace)?;
        validate_path(path)?;

        let data = self
            .blobs
            .read()
            .get(&(namespace.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(namespace, path))?;
        Ok(Box::new(Cursor::new(SharedBytes(data))))
    }

    fn remove(&self, namespace: &str, path: &str) -> StorageResult<bool> {
        validate_namespace(namespace)?;
        validate_path(path)?;

        Ok(self
            .blobs
            .write()
            .remove(&(namespace.to_string(), path.to_string()))
            .is_some())
    }

    fn list(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_namespace(namespace)?;

        let mut paths: Vec<String> = self
            .blobs
            .read()
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, path)| path.clone())
            .collect();
        paths.sort();
        Ok(paths)
    }
}
