//! Deterministic concurrency injection for tests.
//!
//! [`HookedStore`] wraps a document store and runs queued hooks around
//! each `apply`. A `before` hook that commits through the *inner* store
//! simulates a rival writer slipping in between a transaction's read and its
//! commit.
//!
//! ```rust,ignore
//! use blobstate_core::testing::{Hook, HookedStore};
//! use blobstate_core::{DocumentStore, Fields, InMemoryDocumentStore, Op};
//! use std::sync::Arc;
//!
//! let hooked = HookedStore::new(Arc::new(InMemoryDocumentStore::new()));
//! let rival = hooked.inner();
//! hooked.push(Hook::before(move || {
//!     rival.apply(&[Op::insert("c", "a", Fields::new())]).unwrap();
//! }));
//!
//! let err = hooked.apply(&[Op::insert("c", "a", Fields::new())]).unwrap_err();
//! assert!(err.is_aborted());
//! assert_eq!(hooked.pending_hooks(), 0);
//! ```

use crate::document::{DocId, Document, Filter};
use crate::error::CoreResult;
use crate::op::Op;
use crate::store::DocumentStore;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// A one-shot callback run around a commit.
pub type HookFn = Box<dyn FnOnce() + Send>;

/// Callbacks consumed by one `apply`.
#[derive(Default)]
pub struct Hook {
    /// Runs before the batch is applied.
    pub before: Option<HookFn>,
    /// Runs after the batch was applied, whatever the outcome.
    pub after: Option<HookFn>,
}

impl Hook {
    /// A hook with only a `before` callback.
    pub fn before(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            before: Some(Box::new(f)),
            after: None,
        }
    }

    /// A hook with only an `after` callback.
    pub fn after(f: impl FnOnce() + Send + 'static) -> Self {
        Self {
            before: None,
            after: Some(Box::new(f)),
        }
    }

    /// A hook that does nothing; used to let a commit pass untouched.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// A document store decorator that runs queued hooks around each commit.
///
/// Each `apply` pops at most one hook. Reads pass straight through.
pub struct HookedStore<S: DocumentStore + ?Sized> {
    inner: Arc<S>,
    hooks: Mutex<VecDeque<Hook>>,
}

impl<S: DocumentStore + ?Sized> HookedStore<S> {
    /// Wraps `inner` with an empty hook queue.
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            hooks: Mutex::new(VecDeque::new()),
        }
    }

    /// The undecorated store. Commits made through it run no hooks.
    #[must_use]
    pub fn inner(&self) -> Arc<S> {
        Arc::clone(&self.inner)
    }

    /// Replaces the hook queue.
    pub fn set_hooks(&self, hooks: impl IntoIterator<Item = Hook>) {
        *self.hooks.lock() = hooks.into_iter().collect();
    }

    /// Queues one hook.
    pub fn push(&self, hook: Hook) {
        self.hooks.lock().push_back(hook);
    }

    /// Queues a hook with only a `before` callback.
    pub fn push_before(&self, f: impl FnOnce() + Send + 'static) {
        self.push(Hook::before(f));
    }

    /// Queues a hook with only an `after` callback.
    pub fn push_after(&self, f: impl FnOnce() + Send + 'static) {
        self.push(Hook::after(f));
    }

    /// Hooks not yet consumed.
    #[must_use]
    pub fn pending_hooks(&self) -> usize {
        self.hooks.lock().len()
    }
}

impl<S: DocumentStore + ?Sized> fmt::Debug for HookedStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookedStore")
            .field("pending_hooks", &self.pending_hooks())
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for HookedStore<S> {
    fn find_by_id(&self, collection: &str, id: &DocId) -> CoreResult<Option<Document>> {
        self.inner.find_by_id(collection, id)
    }

    fn find(&self, collection: &str, filter: &Filter) -> CoreResult<Vec<Document>> {
        self.inner.find(collection, filter)
    }

    fn apply(&self, ops: &[Op]) -> CoreResult<()> {
        // Released before the callbacks run; they may queue further hooks.
        let hook = self.hooks.lock().pop_front().unwrap_or_default();

        if let Some(before) = hook.before {
            before();
        }
        let result = self.inner.apply(ops);
        if let Some(after) = hook.after {
            after();
        }
        result
    }
}
