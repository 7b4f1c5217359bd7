//! # BlobState Core
//!
//! Documents, conditional operations and the optimistic transaction runner.
//!
//! This crate provides:
//! - flat [`Document`]s of scalar [`Value`]s grouped into collections
//! - conditional operations ([`Op`]) guarded by [`Assert`]ions
//! - the [`DocumentStore`] trait with an in-memory and a journaled file
//!   implementation
//! - the [`Runner`], which rebuilds and recommits a transaction when a
//!   concurrent writer invalidates one of its preconditions
//!
//! ## Example
//!
//! ```rust
//! use blobstate_core::{
//!     Assert, CoreResult, DocId, DocumentStore, Fields, InMemoryDocumentStore, Op, Runner,
//!     RunnerConfig, Value,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let runner = Runner::new(store.clone(), RunnerConfig::default());
//!
//! let mut fields = Fields::new();
//! fields.insert("owner".into(), Value::from("admin"));
//!
//! runner
//!     .run(|attempt: u32| -> CoreResult<Vec<Op>> {
//!         let id = DocId::new("machine-0");
//!         if attempt > 1 && store.find_by_id("machines", &id)?.is_some() {
//!             return Ok(vec![Op::update("machines", id, Assert::Exists, fields.clone())]);
//!         }
//!         Ok(vec![Op::insert("machines", id, fields.clone())])
//!     })
//!     .unwrap();
//!
//! assert_eq!(store.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod document;
mod error;
mod op;
mod store;
mod txn;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{RunnerConfig, StoreConfig, DEFAULT_MAX_ATTEMPTS};
pub use document::{DocId, Document, Fields, Filter, Value};
pub use error::{CoreError, CoreResult};
pub use op::{Assert, Op};
pub use store::{DocumentStore, FileDocumentStore, InMemoryDocumentStore};
pub use txn::{Runner, TransactionSource};
