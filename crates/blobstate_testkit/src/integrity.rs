//! Consistency checks between metadata records and stored blobs.
//!
//! A healthy namespace has exactly one blob per record and no blob without a
//! record. Failed cleanups can leave orphan blobs behind; a blob removed
//! behind the manager's back leaves a dangling record.

use blobstate_core::{CoreResult, DocumentStore, Filter};
use blobstate_resources::{FIELD_BLOBPATH, FIELD_NAMESPACE, RESOURCES_COLLECTION};
use blobstate_storage::BlobStore;
use std::collections::{BTreeMap, BTreeSet};

/// Blob locations referenced by the namespace's records, keyed by record id.
///
/// # Errors
///
/// Returns an error if the document store fails or a record has no blob
/// location.
pub fn referenced_blobs(
    docs: &dyn DocumentStore,
    namespace: &str,
) -> CoreResult<BTreeMap<String, String>> {
    let filter = Filter::all().eq(FIELD_NAMESPACE, namespace);
    docs.find(RESOURCES_COLLECTION, &filter)?
        .iter()
        .map(|doc| {
            let blob_path = doc.text(FIELD_BLOBPATH)?.to_string();
            Ok((doc.id.to_string(), blob_path))
        })
        .collect()
}

/// Stored blobs no record points at, sorted.
///
/// # Errors
///
/// Returns an error if either store fails.
pub fn orphan_blobs(
    docs: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    namespace: &str,
) -> CoreResult<Vec<String>> {
    let referenced: BTreeSet<String> = referenced_blobs(docs, namespace)?
        .into_values()
        .collect();
    Ok(blobs
        .list(namespace)?
        .into_iter()
        .filter(|path| !referenced.contains(path))
        .collect())
}

/// Ids of records whose blob is missing, sorted.
///
/// # Errors
///
/// Returns an error if either store fails.
pub fn dangling_records(
    docs: &dyn DocumentStore,
    blobs: &dyn BlobStore,
    namespace: &str,
) -> CoreResult<Vec<String>> {
    let stored: BTreeSet<String> = blobs.list(namespace)?.into_iter().collect();
    Ok(referenced_blobs(docs, namespace)?
        .into_iter()
        .filter(|(_, blob_path)| !stored.contains(blob_path))
        .map(|(id, _)| id)
        .collect())
}
