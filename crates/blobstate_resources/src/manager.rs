//! The resource storage manager.

use crate::cleanup::Compensation;
use crate::config::ManagerConfig;
use crate::error::{ResourceError, ResourceResult};
use crate::path::ResourcePath;
use crate::record::{
    doc_id, filter_for, new_blob_path, ResourceRecord, FIELD_BLOBPATH, RESOURCES_COLLECTION,
};
use crate::resource::{PutRequest, Resource, ResourceFilter};
use blobstate_core::{Assert, CoreError, DocId, DocumentStore, Op, Runner};
use blobstate_storage::{BlobReader, BlobStore, PutExpectations};
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Why a metadata transaction stopped.
enum TxnFailure {
    Metadata {
        phase: &'static str,
        source: CoreError,
    },
    /// The record disappeared under a delete.
    Gone,
}

impl TxnFailure {
    fn read(source: CoreError) -> Self {
        Self::Metadata {
            phase: "read metadata",
            source,
        }
    }

    fn into_resource_error(self, path: &str) -> ResourceError {
        match self {
            Self::Metadata { phase, source } => ResourceError::from_metadata(path, phase, source),
            Self::Gone => ResourceError::not_found(path),
        }
    }
}

impl From<CoreError> for TxnFailure {
    fn from(source: CoreError) -> Self {
        Self::Metadata {
            phase: "commit metadata",
            source,
        }
    }
}

/// Stores named resources as a blob plus a metadata record, keeping the two
/// consistent under concurrent writers.
///
/// Every operation is scoped to the configured namespace. Managers sharing a
/// document store and blob store coordinate only through the document
/// store's atomic batches; there is no in-process lock per path.
///
/// # Example
///
/// ```rust
/// use blobstate_core::InMemoryDocumentStore;
/// use blobstate_resources::{ManagerConfig, PutRequest, ResourceFilter, ResourceManager};
/// use blobstate_storage::InMemoryBlobStore;
/// use std::io::Read;
/// use std::sync::Arc;
///
/// let manager = ResourceManager::new(
///     ManagerConfig::new("model-1"),
///     Arc::new(InMemoryDocumentStore::new()),
///     Arc::new(InMemoryBlobStore::new()),
/// );
///
/// let stored = manager
///     .put(&PutRequest::new("/blob/s/trusty/tahr.gz"), &b"abc"[..])
///     .unwrap();
/// assert_eq!(stored.size, 3);
///
/// let mut content = String::new();
/// manager
///     .get("/blob/s/trusty/tahr.gz")
///     .unwrap()
///     .read_to_string(&mut content)
///     .unwrap();
/// assert_eq!(content, "abc");
///
/// assert_eq!(manager.list(&ResourceFilter::new().series("trusty")).unwrap().len(), 1);
/// manager.delete("/blob/s/trusty/tahr.gz").unwrap();
/// ```
#[derive(Clone)]
pub struct ResourceManager {
    namespace: String,
    docs: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    runner: Runner,
}

impl ResourceManager {
    /// Creates a manager over the given stores.
    #[must_use]
    pub fn new(
        config: ManagerConfig,
        docs: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let runner = Runner::new(Arc::clone(&docs), config.runner);
        Self {
            namespace: config.namespace,
            docs,
            blobs,
            runner,
        }
    }

    /// The namespace this manager is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Stores `content` under the request's path, replacing any existing
    /// resource there.
    ///
    /// The content is streamed to a fresh blob first and verified against the
    /// request's expected hash and size; the metadata record is then
    /// inserted, or updated if it already exists. The blob the record used to
    /// point at is removed once the update has committed. If the commit fails
    /// the new blob is removed instead.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::InvalidPath`] before any I/O
    /// - [`ResourceError::HashMismatch`] / [`ResourceError::SizeMismatch`];
    ///   no record is written
    /// - [`ResourceError::ExcessiveContention`] when concurrent writers keep
    ///   replacing the record
    /// - wrapped blob store and document store failures
    pub fn put<R: Read>(&self, request: &PutRequest, mut content: R) -> ResourceResult<Resource> {
        let path = ResourcePath::parse(&request.path)?;
        let path_str = path.to_string();
        let id = doc_id(&self.namespace, &path);
        let blob_path = new_blob_path(&path);

        let expect = PutExpectations {
            size: request.size,
            hash: request.sha384,
        };
        let info = self
            .blobs
            .put(&self.namespace, &blob_path, &mut content, &expect)
            .map_err(|e| ResourceError::from_blob(&path_str, "write blob", e))?;

        let record = ResourceRecord {
            namespace: self.namespace.clone(),
            path,
            sha384: info.hash,
            size: info.size,
            created: SystemTime::now(),
            blob_path,
        };

        let mut superseded = None;
        let outcome = record
            .to_fields()
            .map_err(TxnFailure::from)
            .and_then(|fields| {
                self.runner.run(|attempt: u32| -> Result<Vec<Op>, TxnFailure> {
                    superseded = None;
                    let insert = Op::insert(RESOURCES_COLLECTION, id.clone(), fields.clone());
                    if attempt == 1 {
                        return Ok(vec![insert]);
                    }

                    let Some(current) = self.current_blob_path(&id)? else {
                        return Ok(vec![insert]);
                    };
                    if current == record.blob_path {
                        return Ok(Vec::new());
                    }
                    let update = Op::update(
                        RESOURCES_COLLECTION,
                        id.clone(),
                        Assert::field_eq(FIELD_BLOBPATH, current.as_str()),
                        fields.clone(),
                    );
                    superseded = Some(current);
                    Ok(vec![update])
                })
            });

        match outcome {
            Ok(()) => {
                if let Some(old) = superseded {
                    Compensation::RemoveSuperseded { blob_path: old }.run(
                        self.blobs.as_ref(),
                        &self.namespace,
                        &path_str,
                    );
                }
                debug!(
                    namespace = %self.namespace,
                    resource = %path_str,
                    size = record.size,
                    "stored resource"
                );
                Ok(record.into_resource())
            }
            Err(failure) => {
                Compensation::DiscardUncommitted {
                    blob_path: record.blob_path.clone(),
                }
                .run(self.blobs.as_ref(), &self.namespace, &path_str);
                Err(failure.into_resource_error(&path_str))
            }
        }
    }

    /// Opens a resource for reading.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::InvalidPath`] for a malformed path
    /// - [`ResourceError::NotFound`] if there is no record, or the record's
    ///   blob is missing
    /// - wrapped store failures
    pub fn get(&self, path: &str) -> ResourceResult<ResourceReader> {
        let path = ResourcePath::parse(path)?;
        let path_str = path.to_string();
        let record = self
            .load(&path, &path_str)?
            .ok_or_else(|| ResourceError::not_found(&path_str))?;

        match self.blobs.get(&self.namespace, &record.blob_path) {
            Ok(reader) => Ok(ResourceReader {
                resource: record.into_resource(),
                reader,
            }),
            Err(e) if e.is_not_found() => {
                warn!(
                    namespace = %self.namespace,
                    resource = %path_str,
                    blob_path = %record.blob_path,
                    "metadata record has no blob"
                );
                Err(ResourceError::not_found(path_str))
            }
            Err(e) => Err(ResourceError::from_blob(&path_str, "open blob", e)),
        }
    }

    /// Lists the resources matching `filter`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns a wrapped document store failure.
    pub fn list(&self, filter: &ResourceFilter) -> ResourceResult<Vec<Resource>> {
        let list_error =
            |source: CoreError| ResourceError::from_metadata("*", "list metadata", source);

        let docs = self
            .docs
            .find(RESOURCES_COLLECTION, &filter_for(&self.namespace, filter))
            .map_err(list_error)?;

        let mut resources = docs
            .iter()
            .map(|doc| ResourceRecord::from_document(doc).map(ResourceRecord::into_resource))
            .collect::<Result<Vec<_>, _>>()
            .map_err(list_error)?;
        resources.retain(|r| filter.matches(&r.path));
        resources.sort_by_cached_key(|r| r.path.to_string());
        Ok(resources)
    }

    /// Deletes a resource: its blob first, then its record.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NotFound`] if there is no record, including when a
    ///   concurrent delete removed it first
    /// - [`ResourceError::Blob`] if the blob could not be removed; the record
    ///   is left untouched
    /// - wrapped document store failures
    pub fn delete(&self, path: &str) -> ResourceResult<()> {
        let path = ResourcePath::parse(path)?;
        let path_str = path.to_string();
        let id = doc_id(&self.namespace, &path);
        let record = self
            .load(&path, &path_str)?
            .ok_or_else(|| ResourceError::not_found(&path_str))?;

        let existed = self
            .blobs
            .remove(&self.namespace, &record.blob_path)
            .map_err(|e| ResourceError::from_blob(&path_str, "remove blob", e))?;
        if !existed {
            debug!(resource = %path_str, blob_path = %record.blob_path, "blob already gone");
        }

        let observed = record.blob_path.as_str();
        self.runner
            .run(|attempt: u32| -> Result<Vec<Op>, TxnFailure> {
                if attempt > 1 {
                    match self.current_blob_path(&id)? {
                        None => return Err(TxnFailure::Gone),
                        // Replaced since we read it; the new content stays.
                        Some(current) if current != observed => return Ok(Vec::new()),
                        Some(_) => {}
                    }
                }
                Ok(vec![Op::remove(
                    RESOURCES_COLLECTION,
                    id.clone(),
                    Assert::field_eq(FIELD_BLOBPATH, observed),
                )])
            })
            .map_err(|failure| failure.into_resource_error(&path_str))?;

        debug!(namespace = %self.namespace, resource = %path_str, "deleted resource");
        Ok(())
    }

    fn load(&self, path: &ResourcePath, path_str: &str) -> ResourceResult<Option<ResourceRecord>> {
        let read_error =
            |source: CoreError| ResourceError::from_metadata(path_str, "read metadata", source);
        self.docs
            .find_by_id(RESOURCES_COLLECTION, &doc_id(&self.namespace, path))
            .map_err(read_error)?
            .map(|doc| ResourceRecord::from_document(&doc).map_err(read_error))
            .transpose()
    }

    fn current_blob_path(&self, id: &DocId) -> Result<Option<String>, TxnFailure> {
        self.docs
            .find_by_id(RESOURCES_COLLECTION, id)
            .map_err(TxnFailure::read)?
            .map(|doc| {
                doc.text(FIELD_BLOBPATH)
                    .map(str::to_string)
                    .map_err(TxnFailure::read)
            })
            .transpose()
    }
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("namespace", &self.namespace)
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}

/// An open resource: its metadata plus a reader over its content.
///
/// Dropping the reader releases the underlying blob handle.
pub struct ResourceReader {
    resource: Resource,
    reader: BlobReader,
}

impl ResourceReader {
    /// Metadata of the resource being read.
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Splits into metadata and the raw content reader.
    #[must_use]
    pub fn into_parts(self) -> (Resource, BlobReader) {
        (self.resource, self.reader)
    }
}

impl Read for ResourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ResourceReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceReader")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
