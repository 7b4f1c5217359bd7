//! Test fixtures and environment helpers.
//!
//! A [`TestEnv`] wires a [`ResourceManager`] to a document store and a blob
//! store and keeps both reachable, so tests can look underneath the manager.

use crate::integrity;
use blobstate_core::testing::HookedStore;
use blobstate_core::{DocumentStore, FileDocumentStore, InMemoryDocumentStore};
use blobstate_resources::{ManagerConfig, PutRequest, Resource, ResourceManager};
use blobstate_storage::{BlobStore, FileBlobStore, InMemoryBlobStore};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A resource manager over test stores, with automatic cleanup.
pub struct TestEnv {
    /// The manager under test.
    pub manager: ResourceManager,
    /// The metadata store behind the manager.
    pub docs: Arc<dyn DocumentStore>,
    /// The blob store behind the manager.
    pub blobs: Arc<dyn BlobStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestEnv {
    /// Creates an environment over in-memory stores.
    pub fn memory() -> Self {
        Self::memory_with(ManagerConfig::default())
    }

    /// Creates an in-memory environment with the given manager configuration.
    pub fn memory_with(config: ManagerConfig) -> Self {
        Self::over(
            config,
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryBlobStore::new()),
            None,
        )
    }

    /// Creates an environment over file-backed stores in a temporary
    /// directory (`metadata/` and `blobs/`).
    pub fn file() -> Self {
        Self::file_with(ManagerConfig::default())
    }

    /// Creates a file-backed environment with the given manager
    /// configuration.
    pub fn file_with(config: ManagerConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let docs = FileDocumentStore::open(&temp_dir.path().join("metadata"))
            .expect("Failed to open document store");
        let blobs =
            FileBlobStore::open(temp_dir.path().join("blobs")).expect("Failed to open blob store");
        Self::over(config, Arc::new(docs), Arc::new(blobs), Some(temp_dir))
    }

    fn over(
        config: ManagerConfig,
        docs: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let manager = ResourceManager::new(config, Arc::clone(&docs), Arc::clone(&blobs));
        Self {
            manager,
            docs,
            blobs,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the data directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }

    /// Stores `content` at `path`, panicking on failure.
    pub fn put_bytes(&self, path: &str, content: &[u8]) -> Resource {
        self.manager
            .put(&PutRequest::new(path), content)
            .unwrap_or_else(|e| panic!("put {path} failed: {e}"))
    }

    /// Reads the full content at `path`, panicking on failure.
    pub fn read(&self, path: &str) -> Vec<u8> {
        let mut reader = self
            .manager
            .get(path)
            .unwrap_or_else(|e| panic!("get {path} failed: {e}"));
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .unwrap_or_else(|e| panic!("read {path} failed: {e}"));
        content
    }

    /// Blobs in the manager's namespace that no record points at.
    pub fn orphan_blobs(&self) -> Vec<String> {
        integrity::orphan_blobs(&*self.docs, &*self.blobs, self.manager.namespace())
            .expect("Failed to scan for orphan blobs")
    }

    /// Records in the manager's namespace whose blob is missing.
    pub fn dangling_records(&self) -> Vec<String> {
        integrity::dangling_records(&*self.docs, &*self.blobs, self.manager.namespace())
            .expect("Failed to scan for dangling records")
    }
}

impl std::ops::Deref for TestEnv {
    type Target = ResourceManager;

    fn deref(&self) -> &Self::Target {
        &self.manager
    }
}

/// Two managers over shared stores, one of them committing through a
/// [`HookedStore`].
///
/// Hooks queued on `hooked` run around the subject's commits only; the rival
/// commits through the inner store. A hook that makes the rival write
/// simulates a competing writer landing between the subject's read and its
/// commit.
pub struct ContendedEnv {
    /// Decorated metadata store the subject commits through.
    pub hooked: Arc<HookedStore<InMemoryDocumentStore>>,
    /// Blob store shared by both managers.
    pub blobs: Arc<InMemoryBlobStore>,
    /// The manager whose transactions get interfered with.
    pub subject: ResourceManager,
    /// The competing manager.
    pub rival: ResourceManager,
}

impl ContendedEnv {
    /// Creates a contended environment with the given configuration for
    /// both managers.
    pub fn new(config: ManagerConfig) -> Self {
        let hooked = Arc::new(HookedStore::new(Arc::new(InMemoryDocumentStore::new())));
        let blobs = Arc::new(InMemoryBlobStore::new());
        let subject = ResourceManager::new(
            config.clone(),
            Arc::clone(&hooked) as Arc<dyn DocumentStore>,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
        );
        let rival = ResourceManager::new(
            config,
            hooked.inner(),
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
        );
        Self {
            hooked,
            blobs,
            subject,
            rival,
        }
    }

    /// Makes the rival store `content` at `path` before each of the
    /// subject's next `commits` commits.
    pub fn rival_puts(&self, path: &str, content: &[u8], commits: usize) {
        for _ in 0..commits {
            let rival = self.rival.clone();
            let path = path.to_string();
            let content = content.to_vec();
            self.hooked.push_before(move || {
                rival
                    .put(&PutRequest::new(path.as_str()), content.as_slice())
                    .expect("rival put failed");
            });
        }
    }
}

/// Runs a test with a temporary in-memory environment.
pub fn with_memory_env<F, R>(f: F) -> R
where
    F: FnOnce(&TestEnv) -> R,
{
    let env = TestEnv::memory();
    f(&env)
}

/// Runs a test with a temporary file-backed environment.
pub fn with_file_env<F, R>(f: F) -> R
where
    F: FnOnce(&TestEnv, &Path) -> R,
{
    let env = TestEnv::file();
    let path = env
        .path()
        .expect("File environment should have a path")
        .to_path_buf();
    f(&env, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Shared resources `/blob/s/<series>/file-<n>` spread over a few series.
    pub fn sample_paths(count: usize) -> Vec<String> {
        const SERIES: [&str; 3] = ["trusty", "vivid", "xenial"];
        (0..count)
            .map(|n| format!("/blob/s/{}/file-{n}", SERIES[n % SERIES.len()]))
            .collect()
    }

    /// Creates an in-memory environment holding `count` small resources.
    pub fn populated_env(count: usize) -> TestEnv {
        let env = TestEnv::memory();
        for path in sample_paths(count) {
            env.put_bytes(&path, path.as_bytes());
        }
        env
    }
}
