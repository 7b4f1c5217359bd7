//! # BlobState Testkit
//!
//! Test utilities for BlobState.
//!
//! This crate provides:
//! - Fixtures wiring a resource manager to in-memory or file-backed stores
//! - Consistency checks between metadata records and stored blobs
//! - Stress drivers for concurrent writers
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use blobstate_testkit::prelude::*;
//!
//! with_memory_env(|env| {
//!     env.put_bytes("/blob/s/trusty/tahr.gz", b"abc");
//!     assert_eq!(env.read("/blob/s/trusty/tahr.gz"), b"abc");
//!     assert!(env.orphan_blobs().is_empty());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integrity;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integrity::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integrity::*;
pub use stress::*;
