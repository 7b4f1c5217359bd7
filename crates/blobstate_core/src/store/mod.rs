//! Document stores.
//!
//! A document store holds flat documents grouped into named collections and
//! applies batches of [`Op`]s atomically: either every precondition holds and
//! every operation takes effect, or the batch fails with
//! [`CoreError::Aborted`] and nothing changes.
//!
//! Operations within a batch see the effects of the operations before them.

mod file;
mod journal;
mod memory;
mod table;

pub use file::FileDocumentStore;
pub use memory::InMemoryDocumentStore;

use crate::document::{DocId, Document, Filter};
use crate::error::CoreResult;
use crate::op::Op;
use std::sync::Arc;

#[cfg(doc)]
use crate::error::CoreError;

/// A store of documents with atomic conditional batches.
pub trait DocumentStore: Send + Sync {
    /// Looks up one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_by_id(&self, collection: &str, id: &DocId) -> CoreResult<Option<Document>>;

    /// Returns every document in `collection` matching `filter`, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find(&self, collection: &str, filter: &Filter) -> CoreResult<Vec<Document>>;

    /// Applies a batch atomically.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Aborted`] if a precondition failed; nothing was applied
    /// - [`CoreError::InvalidOperation`] for malformed operations
    /// - storage errors from a durable backend
    fn apply(&self, ops: &[Op]) -> CoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn find_by_id(&self, collection: &str, id: &DocId) -> CoreResult<Option<Document>> {
        (**self).find_by_id(collection, id)
    }

    fn find(&self, collection: &str, filter: &Filter) -> CoreResult<Vec<Document>> {
        (**self).find(collection, filter)
    }

    fn apply(&self, ops: &[Op]) -> CoreResult<()> {
        (**self).apply(ops)
    }
}
