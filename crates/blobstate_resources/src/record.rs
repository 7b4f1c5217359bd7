//! Mapping between resources and their metadata documents.

use crate::path::{Owner, ResourcePath, ResourceType};
use crate::resource::{Resource, ResourceFilter};
use blobstate_core::{CoreError, CoreResult, DocId, Document, Fields, Filter, Value};
use blobstate_storage::ContentHash;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Collection holding one metadata document per live resource.
pub const RESOURCES_COLLECTION: &str = "resources";

/// Record field naming the namespace a resource belongs to.
pub const FIELD_NAMESPACE: &str = "namespace";
pub(crate) const FIELD_SHA384: &str = "sha384";
pub(crate) const FIELD_SIZE: &str = "size";
pub(crate) const FIELD_CREATED: &str = "created";
/// Record field holding the blob location, relative to the namespace.
pub const FIELD_BLOBPATH: &str = "blobpath";
const FIELD_TYPE: &str = "type";
const FIELD_USER: &str = "user";
const FIELD_ORG: &str = "org";
const FIELD_STREAM: &str = "stream";
const FIELD_SERIES: &str = "series";
const FIELD_PATHNAME: &str = "pathname";
const FIELD_REVISION: &str = "revision";

/// `"<namespace>:<canonical path>"`.
pub(crate) fn doc_id(namespace: &str, path: &ResourcePath) -> DocId {
    DocId::new(format!("{namespace}:{path}"))
}

/// A fresh, never reused blob location for `path`.
pub(crate) fn new_blob_path(path: &ResourcePath) -> String {
    let path = path.to_string();
    format!(
        "resources/{}/{}",
        path.trim_start_matches('/'),
        Uuid::new_v4().simple()
    )
}

/// The persisted form of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResourceRecord {
    pub namespace: String,
    pub path: ResourcePath,
    pub sha384: ContentHash,
    pub size: u64,
    pub created: SystemTime,
    pub blob_path: String,
}

impl ResourceRecord {
    pub fn to_fields(&self) -> CoreResult<Fields> {
        let id = || doc_id(&self.namespace, &self.path).to_string();
        let size = i64::try_from(self.size)
            .map_err(|_| CoreError::invalid_document(id(), "size does not fit in a record"))?;
        let created = self
            .created
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_nanos()).ok())
            .ok_or_else(|| CoreError::invalid_document(id(), "creation time out of range"))?;

        let owner = self.path.owner();
        let mut fields = Fields::new();
        fields.insert(FIELD_NAMESPACE.into(), self.namespace.as_str().into());
        fields.insert(FIELD_SHA384.into(), self.sha384.to_hex().into());
        fields.insert(FIELD_SIZE.into(), Value::Int(size));
        fields.insert(FIELD_CREATED.into(), Value::Int(created));
        fields.insert(FIELD_BLOBPATH.into(), self.blob_path.as_str().into());
        fields.insert(FIELD_TYPE.into(), self.path.kind().as_str().into());
        fields.insert(FIELD_USER.into(), owner.user().into());
        fields.insert(FIELD_ORG.into(), owner.org().into());
        fields.insert(FIELD_STREAM.into(), self.path.stream().into());
        fields.insert(FIELD_SERIES.into(), self.path.series().into());
        fields.insert(FIELD_PATHNAME.into(), self.path.name().into());
        fields.insert(FIELD_REVISION.into(), self.path.revision().into());
        Ok(fields)
    }

    /// Rebuilds a record, reconstructing the path from its stored attributes.
    pub fn from_document(doc: &Document) -> CoreResult<Self> {
        let invalid = |message: String| CoreError::invalid_document(doc.id.as_str(), message);

        let kind = ResourceType::from_str(doc.text(FIELD_TYPE)?)
            .map_err(|e| invalid(e.to_string()))?;
        let owner = match (doc.opt_text(FIELD_USER)?, doc.opt_text(FIELD_ORG)?) {
            (None, None) => Owner::Shared,
            (Some(user), None) => Owner::User(user.to_string()),
            (None, Some(org)) => Owner::Org(org.to_string()),
            (Some(_), Some(_)) => return Err(invalid("both user and org are set".into())),
        };
        let revision = doc
            .opt_int(FIELD_REVISION)?
            .map(|r| u32::try_from(r).map_err(|_| invalid(format!("revision {r} out of range"))))
            .transpose()?;
        let path = ResourcePath::from_parts(
            kind,
            owner,
            doc.opt_text(FIELD_STREAM)?.map(str::to_string),
            doc.text(FIELD_SERIES)?,
            doc.text(FIELD_PATHNAME)?,
            revision,
        )
        .map_err(|e| invalid(e.to_string()))?;

        let sha384 = ContentHash::from_hex(doc.text(FIELD_SHA384)?)
            .map_err(|e| invalid(e.to_string()))?;
        let size = u64::try_from(doc.int(FIELD_SIZE)?)
            .map_err(|_| invalid("negative size".into()))?;
        let created = u64::try_from(doc.int(FIELD_CREATED)?)
            .map(|nanos| UNIX_EPOCH + Duration::from_nanos(nanos))
            .map_err(|_| invalid("creation time before epoch".into()))?;

        Ok(Self {
            namespace: doc.text(FIELD_NAMESPACE)?.to_string(),
            path,
            sha384,
            size,
            created,
            blob_path: doc.text(FIELD_BLOBPATH)?.to_string(),
        })
    }

    pub fn into_resource(self) -> Resource {
        Resource {
            path: self.path,
            size: self.size,
            sha384: self.sha384,
            created: self.created,
        }
    }
}

/// Document filter selecting the records of `namespace` that `filter` accepts.
pub(crate) fn filter_for(namespace: &str, filter: &ResourceFilter) -> Filter {
    let mut query = Filter::all().eq(FIELD_NAMESPACE, namespace);
    if let Some(kind) = filter.kind {
        query = query.eq(FIELD_TYPE, kind.as_str());
    }
    let text_conditions = [
        (FIELD_USER, &filter.user),
        (FIELD_ORG, &filter.org),
        (FIELD_STREAM, &filter.stream),
        (FIELD_SERIES, &filter.series),
        (FIELD_PATHNAME, &filter.name),
    ];
    for (field, value) in text_conditions {
        if let Some(value) = value {
            query = query.eq(field, value.as_str());
        }
    }
    if let Some(revision) = filter.revision {
        query = query.eq(FIELD_REVISION, revision);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> ResourceRecord {
        let path = ResourcePath::parse(path).unwrap();
        ResourceRecord {
            namespace: "model-1".into(),
            blob_path: new_blob_path(&path),
            path,
            sha384: ContentHash::compute(b"abc"),
            size: 3,
            created: UNIX_EPOCH + Duration::from_nanos(1_500_000_000_123_456_789),
        }
    }

    #[test]
    fn document_round_trip() {
        for path in [
            "/blob/s/trusty/tahr.gz",
            "/zip/u/admin/devel/trusty/agent/12",
            "/blob/org/acme/trusty/tools/0",
        ] {
            let rec = record(path);
            let doc = Document::new(doc_id(&rec.namespace, &rec.path), rec.to_fields().unwrap());
            assert_eq!(ResourceRecord::from_document(&doc).unwrap(), rec);
        }
    }

    #[test]
    fn absent_attributes_are_null() {
        let fields = record("/blob/s/trusty/tahr.gz").to_fields().unwrap();
        for field in [FIELD_USER, FIELD_ORG, FIELD_STREAM, FIELD_REVISION] {
            assert_eq!(fields.get(field), Some(&Value::Null), "{field}");
        }
        assert_eq!(
            fields.get(FIELD_SHA384).and_then(Value::as_text),
            Some(ContentHash::compute(b"abc").to_hex().as_str())
        );
    }

    #[test]
    fn ids_and_blob_paths() {
        let path = ResourcePath::parse("/blob/s/trusty/tahr.gz").unwrap();
        assert_eq!(doc_id("ns", &path).as_str(), "ns:/blob/s/trusty/tahr.gz");

        let a = new_blob_path(&path);
        let b = new_blob_path(&path);
        assert!(a.starts_with("resources/blob/s/trusty/tahr.gz/"));
        assert_ne!(a, b);
    }

    #[test]
    fn corrupt_document_is_rejected() {
        let rec = record("/blob/s/trusty/tahr.gz");
        let mut fields = rec.to_fields().unwrap();
        fields.insert(FIELD_TYPE.into(), "tarball".into());
        let doc = Document::new(doc_id(&rec.namespace, &rec.path), fields);
        assert!(matches!(
            ResourceRecord::from_document(&doc),
            Err(CoreError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn filter_translation() {
        let rec = record("/zip/u/admin/devel/trusty/agent/12");
        let fields = rec.to_fields().unwrap();

        assert!(filter_for("model-1", &ResourceFilter::new()).matches(&fields));
        assert!(!filter_for("model-2", &ResourceFilter::new()).matches(&fields));
        assert!(filter_for(
            "model-1",
            &ResourceFilter::new()
                .kind(ResourceType::Zip)
                .user("admin")
                .series("trusty")
                .revision(12)
        )
        .matches(&fields));
        assert!(!filter_for("model-1", &ResourceFilter::new().series("vivid")).matches(&fields));
        assert!(!filter_for("model-1", &ResourceFilter::new().org("admin")).matches(&fields));
    }
}
