//! Namespaced blob stores.

mod file;
mod memory;

pub use file::FileBlobStore;
pub use memory::InMemoryBlobStore;

use crate::error::{StorageError, StorageResult};
use crate::hash::{ContentHash, ContentHasher};
use std::io::{self, Read, Write};

/// Streaming reader over a stored blob.
pub type BlobReader = Box<dyn Read + Send>;

/// Chunk size used when streaming content into a store.
const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// What the caller claims about content it is about to store.
///
/// Any announced value is verified while streaming; a mismatch fails the
/// put and nothing is published under the target path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutExpectations {
    /// Exact content length, if known.
    pub size: Option<u64>,
    /// SHA-384 of the content, if known.
    pub hash: Option<ContentHash>,
}

impl PutExpectations {
    /// No expectations: length and hash are computed, not checked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects exactly `size` bytes.
    #[must_use]
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Expects content hashing to `hash`.
    #[must_use]
    pub const fn with_hash(mut self, hash: ContentHash) -> Self {
        self.hash = Some(hash);
        self
    }
}

/// Authoritative description of a blob after it has been stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobInfo {
    /// Number of bytes stored.
    pub size: u64,
    /// SHA-384 of the stored bytes.
    pub hash: ContentHash,
}

/// A multi-tenant store of opaque binary payloads.
///
/// Every operation is scoped by an explicit namespace; the same path in two
/// namespaces names two unrelated blobs. Paths are `/`-separated relative
/// keys (`a/b/c`) chosen by the caller and never interpreted.
///
/// # Contract
///
/// - `put` publishes the blob only once the whole stream has been read and
///   verified; a failed put leaves nothing behind under `path`
/// - `remove` is idempotent: removing an absent blob returns `Ok(false)`
/// - implementations must be `Send + Sync`; concurrent puts to distinct
///   paths must not interfere
pub trait BlobStore: Send + Sync {
    /// Streams `content` into the store under `namespace`/`path`, replacing
    /// any previous blob at that location.
    ///
    /// # Errors
    ///
    /// - [`StorageError::SizeMismatch`] / [`StorageError::HashMismatch`] if
    ///   the content does not match `expect`
    /// - [`StorageError::InvalidPath`] for malformed locations
    /// - I/O errors from the content stream or the backend
    fn put(
        &self,
        namespace: &str,
        path: &str,
        content: &mut dyn Read,
        expect: &PutExpectations,
    ) -> StorageResult<BlobInfo>;

    /// Opens a blob for streaming reads.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no blob exists at the location.
    fn get(&self, namespace: &str, path: &str) -> StorageResult<BlobReader>;

    /// Removes a blob. Returns `false` if it was already absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the location is malformed or the backend fails.
    fn remove(&self, namespace: &str, path: &str) -> StorageResult<bool>;

    /// Lists every blob path in a namespace, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is malformed or the backend fails.
    fn list(&self, namespace: &str) -> StorageResult<Vec<String>>;
}

/// Rejects namespaces that could escape or alias another tenant.
pub(crate) fn validate_namespace(namespace: &str) -> StorageResult<()> {
    if namespace.is_empty()
        || namespace == "."
        || namespace == ".."
        || namespace.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::invalid_path(format!(
            "namespace {namespace:?} is not a single path component"
        )));
    }
    Ok(())
}

/// Rejects blob paths with empty, relative or absolute components.
pub(crate) fn validate_path(path: &str) -> StorageResult<()> {
    if path.is_empty() || path.contains(['\\', '\0']) {
        return Err(StorageError::invalid_path(format!("blob path {path:?}")));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StorageError::invalid_path(format!(
                "blob path {path:?} has unsafe component {segment:?}"
            )));
        }
    }
    Ok(())
}

/// Copies `content` into `sink` while counting and hashing, then checks the
/// result against `expect`.
///
/// Reading stops as soon as an announced size is exceeded.
pub(crate) fn copy_verified<W: Write>(
    content: &mut dyn Read,
    sink: &mut W,
    expect: &PutExpectations,
) -> StorageResult<BlobInfo> {
    let mut hasher = ContentHasher::new();
    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];

    loop {
        let n = match content.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..n]);
        if let Some(expected) = expect.size {
            if hasher.len() > expected {
                return Err(StorageError::SizeMismatch {
                    expected,
                    actual: hasher.len(),
                });
            }
        }
        sink.write_all(&buffer[..n])?;
    }
    sink.flush()?;

    let size = hasher.len();
    if let Some(expected) = expect.size {
        if size != expected {
            return Err(StorageError::SizeMismatch {
                expected,
                actual: size,
            });
        }
    }

    let hash = hasher.finalize();
    if let Some(expected) = expect.hash {
        if hash != expected {
            return Err(StorageError::HashMismatch {
                expected: expected.to_hex(),
                actual: hash.to_hex(),
            });
        }
    }

    Ok(BlobInfo { size, hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_computes_size_and_hash() {
        let mut sink = Vec::new();
        let info = copy_verified(&mut &b"abc"[..], &mut sink, &PutExpectations::new()).unwrap();
        assert_eq!(sink, b"abc");
        assert_eq!(info.size, 3);
        assert_eq!(info.hash, ContentHash::compute(b"abc"));
    }

    #[test]
    fn copy_rejects_short_content() {
        let expect = PutExpectations::new().with_size(4);
        let result = copy_verified(&mut &b"abc"[..], &mut Vec::new(), &expect);
        assert!(matches!(
            result,
            Err(StorageError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn copy_stops_once_size_exceeded() {
        let content = vec![7u8; COPY_CHUNK_SIZE * 3];
        let expect = PutExpectations::new().with_size(10);
        let mut sink = Vec::new();
        let result = copy_verified(&mut content.as_slice(), &mut sink, &expect);
        assert!(matches!(result, Err(StorageError::SizeMismatch { .. })));
        assert!(sink.is_empty());
    }

    #[test]
    fn copy_rejects_wrong_hash() {
        let expect = PutExpectations::new().with_hash(ContentHash::compute(b"other"));
        let result = copy_verified(&mut &b"abc"[..], &mut Vec::new(), &expect);
        assert!(matches!(result, Err(StorageError::HashMismatch { .. })));
    }

    #[test]
    fn namespace_validation() {
        assert!(validate_namespace("model-1").is_ok());
        assert!(validate_namespace("").is_err());
        assert!(validate_namespace("..").is_err());
        assert!(validate_namespace("a/b").is_err());
    }

    #[test]
    fn path_validation() {
        assert!(validate_path("resources/blob/s/trusty/tahr.gz/abc").is_ok());
        assert!(validate_path("/absolute").is_err());
        assert!(validate_path("a//b").is_err());
        assert!(validate_path("a/../b").is_err());
        assert!(validate_path("trailing/").is_err());
    }
}
