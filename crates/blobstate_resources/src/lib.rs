//! # BlobState Resources
//!
//! Transactional resource storage. A resource is a named binary payload:
//! its content lives in a [`BlobStore`](blobstate_storage::BlobStore), its
//! metadata in a record of the `resources` collection of a
//! [`DocumentStore`](blobstate_core::DocumentStore). The
//! [`ResourceManager`] keeps the two consistent:
//!
//! - a record only ever points at a blob that was fully written and verified
//! - a blob displaced by a replacement is removed after the replacement commits
//! - a blob whose commit failed is removed again
//!
//! Metadata changes go through the retrying
//! [`Runner`](blobstate_core::Runner), so concurrent writers to one path
//! settle on a single winner without any lock around the path.
//!
//! Resources are addressed by [`ResourcePath`]s such as
//! `/blob/s/trusty/tahr.gz` or `/zip/u/admin/devel/trusty/agent/3`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cleanup;
mod config;
mod error;
mod manager;
mod path;
mod record;
mod resource;

pub use config::{ManagerConfig, DEFAULT_NAMESPACE};
pub use error::{ResourceError, ResourceResult};
pub use manager::{ResourceManager, ResourceReader};
pub use path::{Owner, ResourcePath, ResourceType};
pub use record::{FIELD_BLOBPATH, FIELD_NAMESPACE, RESOURCES_COLLECTION};
pub use resource::{PutRequest, Resource, ResourceFilter};
