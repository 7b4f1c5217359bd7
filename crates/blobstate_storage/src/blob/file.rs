//! Filesystem blob store.
//!
//! Layout: `<root>/<namespace>/<blob path>`. Writes land in a hidden temp
//! file next to the target and are renamed into place once verified, so a
//! reader never observes a partial blob.

use super::{
    copy_verified, validate_namespace, validate_path, BlobInfo, BlobReader, BlobStore,
    PutExpectations,
};
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, IntoInnerError, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const TEMP_PREFIX: char = '.';
const TEMP_SUFFIX: &str = ".tmp";

/// A blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn location(&self, namespace: &str, path: &str) -> StorageResult<PathBuf> {
        validate_namespace(namespace)?;
        validate_path(path)?;
        let mut full = self.root.join(namespace);
        for segment in path.split('/') {
            full.push(segment);
        }
        Ok(full)
    }
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// Removes `dir` and its ancestors while they are empty, stopping at `base`.
fn prune_empty_dirs(base: &Path, dir: Option<&Path>) {
    let mut current = dir;
    while let Some(path) = current {
        if path == base || !path.starts_with(base) {
            break;
        }
        if let Err(e) = fs::remove_dir(path) {
            debug!(dir = %path.display(), error = %e, "stopped pruning blob directories");
            break;
        }
        current = path.parent();
    }
}

/// Creates the temp file, recreating its directory if a concurrent remove
/// pruned it in between.
fn create_temp(temp: &Path) -> StorageResult<File> {
    let mut attempts = 0;
    loop {
        match File::create(temp) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound && attempts < 3 => {
                attempts += 1;
                if let Some(parent) = temp.parent() {
                    fs::create_dir_all(parent)?;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn write_temp(
    temp: &Path,
    content: &mut dyn Read,
    expect: &PutExpectations,
) -> StorageResult<BlobInfo> {
    let mut writer = BufWriter::new(create_temp(temp)?);
    let info = copy_verified(content, &mut writer, expect)?;
    let file = writer.into_inner().map_err(IntoInnerError::into_error)?;
    file.sync_all()?;
    Ok(info)
}

impl BlobStore for FileBlobStore {
    fn put(
        &self,
        namespace: &str,
        path: &str,
        content: &mut dyn Read,
        expect: &PutExpectations,
    ) -> StorageResult<BlobInfo> {
        let target = self.location(namespace, path)?;
        let (Some(parent), Some(name)) = (target.parent(), target.file_name()) else {
            return Err(StorageError::invalid_path(path.to_string()));
        };
        fs::create_dir_all(parent)?;

        let temp = parent.join(format!(
            "{TEMP_PREFIX}{}.{}{TEMP_SUFFIX}",
            name.to_string_lossy(),
            Uuid::new_v4().simple()
        ));

        let written = write_temp(&temp, content, expect).and_then(|info| {
            fs::rename(&temp, &target)?;
            Ok(info)
        });
        if written.is_err() {
            if let Err(e) = fs::remove_file(&temp) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(temp = %temp.display(), error = %e, "failed to remove temp blob");
                }
            }
        }
        let info = written?;
        debug!(namespace, path, size = info.size, "stored blob");
        Ok(info)
    }

    fn get(&self, namespace: &str, path: &str) -> StorageResult<BlobReader> {
        let target = self.location(namespace, path)?;
        match File::open(&target) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::not_found(namespace, path))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, namespace: &str, path: &str) -> StorageResult<bool> {
        let target = self.location(namespace, path)?;
        match fs::remove_file(&target) {
            Ok(()) => {
                prune_empty_dirs(&self.root.join(namespace), target.parent());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_namespace(namespace)?;
        let base = self.root.join(namespace);
        let mut paths = Vec::new();
        if base.is_dir() {
            collect(&base, "", &mut paths)?;
        }
        paths.sort();
        Ok(paths)
    }
}

fn collect(dir: &Path, prefix: &str, out: &mut Vec<String>) -> StorageResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect(&entry.path(), &key, out)?;
        } else if file_type.is_file() && !is_temp_name(&name) {
            out.push(key);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ContentHash;
    use tempfile::tempdir;

    #[test]
    fn put_get_and_list() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();

        store
            .put("ns", "resources/a/1", &mut &b"one"[..], &PutExpectations::new())
            .unwrap();
        store
            .put("ns", "resources/b", &mut &b"two"[..], &PutExpectations::new())
            .unwrap();

        let mut out = String::new();
        store
            .get("ns", "resources/a/1")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "one");
        assert_eq!(
            store.list("ns").unwrap(),
            vec!["resources/a/1".to_string(), "resources/b".to_string()]
        );
        assert!(store.list("other").unwrap().is_empty());
    }

    #[test]
    fn failed_put_leaves_no_file() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        let expect = PutExpectations::new().with_hash(ContentHash::compute(b"different"));

        let result = store.put("ns", "x/y", &mut &b"content"[..], &expect);
        assert!(matches!(result, Err(StorageError::HashMismatch { .. })));
        assert!(store.list("ns").unwrap().is_empty());
        assert_eq!(fs::read_dir(dir.path().join("ns/x")).unwrap().count(), 0);
    }

    #[test]
    fn put_replaces_existing() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        store
            .put("ns", "a", &mut &b"old"[..], &PutExpectations::new())
            .unwrap();
        store
            .put("ns", "a", &mut &b"new"[..], &PutExpectations::new())
            .unwrap();

        let mut out = Vec::new();
        store.get("ns", "a").unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"new");
    }

    #[test]
    fn missing_blob_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        assert!(store.get("ns", "nope").err().unwrap().is_not_found());
        assert!(!store.remove("ns", "nope").unwrap());
    }

    #[test]
    fn remove_prunes_empty_directories() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        let path = "resources/blob/s/trusty/tahr.gz/0123";
        store
            .put("ns", path, &mut &b"one"[..], &PutExpectations::new())
            .unwrap();
        store
            .put("ns", "resources/blob/s/vivid/x/4567", &mut &b"two"[..], &PutExpectations::new())
            .unwrap();

        assert!(store.remove("ns", path).unwrap());
        assert!(!dir.path().join("ns/resources/blob/s/trusty").exists());
        assert!(dir.path().join("ns/resources/blob/s/vivid/x").is_dir());

        assert!(store.remove("ns", "resources/blob/s/vivid/x/4567").unwrap());
        assert!(dir.path().join("ns").is_dir());
        assert_eq!(fs::read_dir(dir.path().join("ns")).unwrap().count(), 0);

        store
            .put("ns", path, &mut &b"again"[..], &PutExpectations::new())
            .unwrap();
        assert_eq!(store.list("ns").unwrap(), vec![path.to_string()]);
    }

    #[test]
    fn traversal_is_rejected() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        let result = store.put("ns", "../escape", &mut &b"x"[..], &PutExpectations::new());
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
        assert!(store.get("..", "a").is_err());
    }

    #[test]
    fn list_skips_temp_files() {
        let dir = tempdir().unwrap();
        let store = FileBlobStore::open(dir.path()).unwrap();
        store
            .put("ns", "a/real", &mut &b"x"[..], &PutExpectations::new())
            .unwrap();
        fs::write(dir.path().join("ns/a/.real.abc.tmp"), b"partial").unwrap();

        assert_eq!(store.list("ns").unwrap(), vec!["a/real".to_string()]);
    }
}
