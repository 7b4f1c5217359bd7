//! # BlobState Storage
//!
//! The two storage primitives BlobState is built on:
//!
//! - **Byte logs** ([`LogBackend`]): opaque append-only byte stores. The
//!   document journal in `blobstate_core` is written through one.
//! - **Blob stores** ([`BlobStore`]): namespaced, path-keyed binary payloads.
//!   Every `put` is streamed, counted and SHA-384 hashed, and optionally
//!   verified against a caller-supplied size and hash before the blob becomes
//!   visible.
//!
//! Neither primitive knows anything about resources or metadata records.
//!
//! ## Available Implementations
//!
//! - [`MemoryLog`] / [`FileLog`]
//! - [`InMemoryBlobStore`] / [`FileBlobStore`]
//!
//! ## Example
//!
//! ```rust
//! use blobstate_storage::{BlobStore, ContentHash, InMemoryBlobStore, PutExpectations};
//! use std::io::Read;
//!
//! let store = InMemoryBlobStore::new();
//! let info = store
//!     .put("model-1", "tools/agent", &mut &b"abc"[..], &PutExpectations::new())
//!     .unwrap();
//! assert_eq!(info.size, 3);
//! assert_eq!(info.hash, ContentHash::compute(b"abc"));
//!
//! let mut content = Vec::new();
//! store.get("model-1", "tools/agent").unwrap().read_to_end(&mut content).unwrap();
//! assert_eq!(content, b"abc");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod error;
mod hash;
mod log;

pub use blob::{
    BlobInfo, BlobReader, BlobStore, FileBlobStore, InMemoryBlobStore, PutExpectations,
};
pub use error::{StorageError, StorageResult};
pub use hash::{ContentHash, ContentHasher, HASH_SIZE};
pub use log::{FileLog, LogBackend, MemoryLog};
