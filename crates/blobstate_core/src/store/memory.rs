//! In-memory document store.

use super::table::Tables;
use super::DocumentStore;
use crate::document::{DocId, Document, Filter};
use crate::error::CoreResult;
use crate::op::Op;
use parking_lot::RwLock;
use tracing::trace;

/// A document store held in memory.
///
/// Batches are staged and installed under one write lock, so readers never
/// observe a partially applied batch.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    tables: RwLock<Tables>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

impl DocumentStore for InMemoryDocumentStore {
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
        let mut tables = self.tables.write();
        let changes = tables.stage(ops)?;
        trace!(ops = ops.len(), changes = changes.len(), "applied batch");
        tables.install(changes);
        Ok(())
    }
}
