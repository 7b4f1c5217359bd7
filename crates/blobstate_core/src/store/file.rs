//! Durable, journal-backed document store.
//!
//! Directory layout:
//!
//! ```text
//! <dir>/
//! ├─ LOCK               # advisory lock held while the store is open
//! └─ documents.journal  # one record per committed batch
//! ```

use super::journal::Journal;
use super::table::Tables;
use super::DocumentStore;
use crate::config::StoreConfig;
use crate::document::{DocId, Document, Filter};
use crate::error::{CoreError, CoreResult};
use crate::op::Op;
use blobstate_storage::{FileLog, LogBackend};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_FILE: &str = "LOCK";
const JOURNAL_FILE: &str = "documents.journal";

/// A document store whose committed batches survive restarts.
///
/// The full document set is kept in memory and rebuilt from the journal on
/// open. Commits are serialized: a batch is staged against the current
/// state, appended to the journal, and only then made visible.
pub struct FileDocumentStore {
    tables: RwLock<Tables>,
    journal: Mutex<Journal>,
    path: Option<PathBuf>,
    _lock_file: Option<File>,
}

impl FileDocumentStore {
    /// Opens the store in `dir` with default configuration.
    ///
    /// # Errors
    ///
    /// See [`FileDocumentStore::open_with_config`].
    pub fn open(dir: &Path) -> CoreResult<Self> {
        Self::open_with_config(dir, &StoreConfig::default())
    }

    /// Opens the store in `dir`, replaying its journal.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the directory doesn't exist and `create_if_missing` is false
    /// - another process holds the lock (`StoreLocked`)
    /// - the journal is corrupted
    /// - I/O errors occur
    pub fn open_with_config(dir: &Path, config: &StoreConfig) -> CoreResult<Self> {
        if !dir.exists() {
            if config.create_if_missing {
                fs::create_dir_all(dir)?;
            } else {
                return Err(CoreError::invalid_operation(format!(
                    "store directory does not exist: {}",
                    dir.display()
                )));
            }
        }
        if !dir.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                dir.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(CoreError::StoreLocked);
        }

        let log = FileLog::open(&dir.join(JOURNAL_FILE))?;
        let mut store = Self::from_log(Box::new(log), config)?;
        store.path = Some(dir.to_path_buf());
        store._lock_file = Some(lock_file);
        debug!(path = %dir.display(), "opened document store");
        Ok(store)
    }

    /// Builds a store over an arbitrary byte log, replaying what it holds.
    ///
    /// No directory lock is taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the log holds a corrupted journal.
    pub fn from_log(log: Box<dyn LogBackend>, config: &StoreConfig) -> CoreResult<Self> {
        let mut journal = Journal::new(log, config.sync_on_commit);
        let mut tables = Tables::default();
        for batch in journal.replay()? {
            tables.install(batch);
        }

        Ok(Self {
            tables: RwLock::new(tables),
            journal: Mutex::new(journal),
            path: None,
            _lock_file: None,
        })
    }

    /// Directory the store lives in, if it was opened from one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of documents across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    /// Returns true if the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for FileDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDocumentStore")
            .field("path", &self.path)
            .field("documents", &self.len())
            .finish_non_exhaustive()
    }
}

impl DocumentStore for FileDocumentStore {
    fn find_by_id(&self, collection: &str, id: &DocId) -> CoreResult<Option<Document>> {
        Ok(self
            .tables
            .read()
            .get(collection, id)
            .map(|fields| Document::new(id.clone(), fields.clone())))
    }

    fn find(&self, collection: &str, filter: &Filter) -> CoreResult<Vec<Document>> {
        Ok(self.tables.read().find(collection, filter))
    }

    fn apply(&self, ops: &[Op]) -> CoreResult<()> {
        // Holding the journal lock serializes writers; tables only change
        // under it, so staging against a read snapshot is sound.
        let mut journal = self.journal.lock();
        let changes = self.tables.read().stage(ops)?;
        if changes.is_empty() {
            return Ok(());
        }
        journal.append(&changes)?;
        self.tables.write().install(changes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Fields, Value};
    use crate::op::Assert;
    use std::io::Write;
    use tempfile::tempdir;

    fn fields(v: &str) -> Fields {
        let mut f = Fields::new();
        f.insert("v".into(), Value::from(v));
        f
    }

    #[test]
    fn survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileDocumentStore::open(dir.path()).unwrap();
            store.apply(&[Op::insert("c", "a", fields("1"))]).unwrap();
            store.apply(&[Op::insert("c", "b", fields("2"))]).unwrap();
            store.apply(&[Op::remove("c", "a", Assert::Exists)]).unwrap();
        }

        let store = FileDocumentStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
        let doc = store.find_by_id("c", &DocId::new("b")).unwrap().unwrap();
        assert_eq!(doc.fields, fields("2"));
    }

    #[test]
    fn aborted_batch_is_not_journaled() {
        let dir = tempdir().unwrap();
        {
            let store = FileDocumentStore::open(dir.path()).unwrap();
            store.apply(&[Op::insert("c", "a", fields("1"))]).unwrap();
            let err = store
                .apply(&[
                    Op::insert("c", "b", fields("2")),
                    Op::insert("c", "a", fields("dup")),
                ])
                .unwrap_err();
            assert!(err.is_aborted());
        }

        let store = FileDocumentStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn second_open_is_locked() {
        let dir = tempdir().unwrap();
        let _first = FileDocumentStore::open(dir.path()).unwrap();
        assert!(matches!(
            FileDocumentStore::open(dir.path()),
            Err(CoreError::StoreLocked)
        ));
    }

    #[test]
    fn missing_dir_without_create_fails() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new().create_if_missing(false);
        let result = FileDocumentStore::open_with_config(&dir.path().join("nope"), &config);
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
    }

    #[test]
    fn torn_tail_is_truncated_on_open() {
        let dir = tempdir().unwrap();
        {
            let store = FileDocumentStore::open(dir.path()).unwrap();
            store.apply(&[Op::insert("c", "a", fields("1"))]).unwrap();
        }
        let journal = dir.path().join(JOURNAL_FILE);
        let good_len = fs::metadata(&journal).unwrap().len();
        {
            let mut file = OpenOptions::new().append(true).open(&journal).unwrap();
            file.write_all(b"BSJ1\x01\x00\xff\x00\x00\x00partial").unwrap();
        }

        {
            let store = FileDocumentStore::open(dir.path()).unwrap();
            assert_eq!(store.len(), 1);
            store.apply(&[Op::insert("c", "b", fields("2"))]).unwrap();
        }
        assert!(fs::metadata(&journal).unwrap().len() > good_len);

        let store = FileDocumentStore::open(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn corrupted_record_refuses_to_open() {
        let dir = tempdir().unwrap();
        {
            let store = FileDocumentStore::open(dir.path()).unwrap();
            store.apply(&[Op::insert("c", "a", fields("1"))]).unwrap();
        }
        let journal = dir.path().join(JOURNAL_FILE);
        let mut bytes = fs::read(&journal).unwrap();
        let last_payload_byte = bytes.len() - 5;
        bytes[last_payload_byte] ^= 0xff;
        fs::write(&journal, bytes).unwrap();

        assert!(matches!(
            FileDocumentStore::open(dir.path()),
            Err(CoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn memory_log_backed_store() {
        let log = Box::new(blobstate_storage::MemoryLog::new());
        let store = FileDocumentStore::from_log(log, &StoreConfig::default()).unwrap();
        store.apply(&[Op::insert("c", "a", fields("1"))]).unwrap();
        assert!(store.path().is_none());
        assert_eq!(store.find("c", &Filter::all()).unwrap().len(), 1);
    }
}
