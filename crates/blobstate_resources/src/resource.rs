//! Caller-facing resource types.

use crate::path::{ResourcePath, ResourceType};
use blobstate_storage::ContentHash;
use std::time::SystemTime;

/// A stored resource as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Logical path.
    pub path: ResourcePath,
    /// Content length in bytes.
    pub size: u64,
    /// SHA-384 of the content.
    pub sha384: ContentHash,
    /// When this content was stored.
    pub created: SystemTime,
}

/// A request to store content under a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    /// Logical path; parsed before any I/O happens.
    pub path: String,
    /// Expected SHA-384; the put fails if the content differs.
    pub sha384: Option<ContentHash>,
    /// Expected length; the put fails if the content differs.
    pub size: Option<u64>,
}

impl PutRequest {
    /// A request with no expectations about the content.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sha384: None,
            size: None,
        }
    }

    /// Requires the content to hash to `hash`.
    #[must_use]
    pub fn with_sha384(mut self, hash: ContentHash) -> Self {
        self.sha384 = Some(hash);
        self
    }

    /// Requires the content to be exactly `size` bytes.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// Partial match over path attributes; `None` matches anything.
///
/// Setting `user` or `org` also restricts the owner kind: a filter on user
/// `admin` never matches shared or organization resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    /// Resource type.
    pub kind: Option<ResourceType>,
    /// Owning user.
    pub user: Option<String>,
    /// Owning organization.
    pub org: Option<String>,
    /// Release stream.
    pub stream: Option<String>,
    /// Series.
    pub series: Option<String>,
    /// Pathname.
    pub name: Option<String>,
    /// Revision.
    pub revision: Option<u32>,
}

impl ResourceFilter {
    /// A filter matching every resource.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the type.
    #[must_use]
    pub fn kind(mut self, kind: ResourceType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts to one owning user.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Restricts to one owning organization.
    #[must_use]
    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Restricts the stream.
    #[must_use]
    pub fn stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Restricts the series.
    #[must_use]
    pub fn series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    /// Restricts the pathname.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts the revision.
    #[must_use]
    pub fn revision(mut self, revision: u32) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Returns true if `path` satisfies every set attribute.
    #[must_use]
    pub fn matches(&self, path: &ResourcePath) -> bool {
        fn accepts(want: Option<&str>, have: Option<&str>) -> bool {
            want.map_or(true, |w| have == Some(w))
        }

        self.kind.map_or(true, |k| k == path.kind())
            && accepts(self.user.as_deref(), path.owner().user())
            && accepts(self.org.as_deref(), path.owner().org())
            && accepts(self.stream.as_deref(), path.stream())
            && accepts(self.series.as_deref(), Some(path.series()))
            && accepts(self.name.as_deref(), Some(path.name()))
            && self.revision.map_or(true, |r| Some(r) == path.revision())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matching() {
        let path = ResourcePath::parse("/blob/u/admin/devel/trusty/agent/3").unwrap();

        assert!(ResourceFilter::new().matches(&path));
        assert!(ResourceFilter::new().series("trusty").matches(&path));
        assert!(!ResourceFilter::new().series("vivid").matches(&path));
        assert!(ResourceFilter::new()
            .kind(ResourceType::Blob)
            .user("admin")
            .stream("devel")
            .name("agent")
            .revision(3)
            .matches(&path));
        assert!(!ResourceFilter::new().org("admin").matches(&path));
        assert!(!ResourceFilter::new().revision(4).matches(&path));
        assert!(!ResourceFilter::new().kind(ResourceType::Zip).matches(&path));
    }

    #[test]
    fn filter_on_absent_attribute() {
        let shared = ResourcePath::parse("/blob/s/trusty/agent").unwrap();
        assert!(!ResourceFilter::new().user("admin").matches(&shared));
        assert!(!ResourceFilter::new().stream("devel").matches(&shared));
        assert!(!ResourceFilter::new().revision(0).matches(&shared));
    }

    #[test]
    fn put_request_builder() {
        let hash = ContentHash::compute(b"abc");
        let req = PutRequest::new("/blob/s/trusty/tahr.gz")
            .with_sha384(hash)
            .with_size(3);
        assert_eq!(req.sha384, Some(hash));
        assert_eq!(req.size, Some(3));
    }
}
