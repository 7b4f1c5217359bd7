//! List command implementation.

use blobstate_resources::{Resource, ResourceFilter, ResourceManager, ResourceType};
use serde::Serialize;
use std::str::FromStr;
use std::time::UNIX_EPOCH;
use tracing::info;

/// Filter flags as given on the command line.
#[derive(Debug, Default)]
pub struct FilterArgs {
    /// Resource type.
    pub kind: Option<String>,
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

impl FilterArgs {
    /// Builds the resource filter, validating the type.
    pub fn into_filter(self) -> Result<ResourceFilter, Box<dyn std::error::Error>> {
        let kind = self
            .kind
            .as_deref()
            .map(ResourceType::from_str)
            .transpose()?;
        Ok(ResourceFilter {
            kind,
            user: self.user,
            org: self.org,
            stream: self.stream,
            series: self.series,
            name: self.name,
            revision: self.revision,
        })
    }
}

/// One listed resource.
#[derive(Debug, Serialize)]
pub struct ListEntry {
    /// Resource path.
    pub path: String,
    /// Content length in bytes.
    pub size: u64,
    /// SHA-384 of the content (hex).
    pub sha384: String,
    /// Creation time, nanoseconds since the Unix epoch.
    pub created: u128,
}

impl From<&Resource> for ListEntry {
    fn from(resource: &Resource) -> Self {
        Self {
            path: resource.path.to_string(),
            size: resource.size,
            sha384: resource.sha384.to_hex(),
            created: resource
                .created
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default(),
        }
    }
}

/// Runs the list command.
pub fn run(
    manager: &ResourceManager,
    args: FilterArgs,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = args.into_filter()?;
    let entries: Vec<ListEntry> = manager.list(&filter)?.iter().map(ListEntry::from).collect();
    info!(count = entries.len(), "listed resources");
    println!("{}", render(&entries, format)?);
    Ok(())
}

/// Renders entries as `text` (one per line) or `json`.
pub fn render(entries: &[ListEntry], format: &str) -> Result<String, Box<dyn std::error::Error>> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(entries)?),
        "text" => {
            let width = entries.iter().map(|e| e.path.len()).max().unwrap_or(0);
            let lines: Vec<String> = entries
                .iter()
                .map(|e| format!("{:width$}  {:>10}  {}", e.path, e.size, &e.sha384[..16]))
                .collect();
            Ok(lines.join("\n"))
        }
        other => Err(format!("unknown format {other:?} (expected text or json)").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::open_manager;
    use blobstate_resources::PutRequest;
    use tempfile::tempdir;

    #[test]
    fn filters_by_flags() {
        let dir = tempdir().unwrap();
        let manager = open_manager(dir.path(), "default").unwrap();
        for path in ["/blob/s/trusty/tahr.gz", "/zip/s/trusty/agent", "/blob/s/vivid/x"] {
            manager.put(&PutRequest::new(path), &b"abc"[..]).unwrap();
        }

        let args = FilterArgs {
            kind: Some("blob".into()),
            series: Some("trusty".into()),
            ..FilterArgs::default()
        };
        let listed = manager.list(&args.into_filter().unwrap()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].path.to_string(), "/blob/s/trusty/tahr.gz");
    }

    #[test]
    fn rejects_unknown_type() {
        let args = FilterArgs {
            kind: Some("tar".into()),
            ..FilterArgs::default()
        };
        assert!(args.into_filter().is_err());
    }

    #[test]
    fn renders_json_and_text() {
        let entries = vec![ListEntry {
            path: "/blob/s/trusty/tahr.gz".into(),
            size: 3,
            sha384: "cb00753f45a35e8bb5a03d699ac65007".into(),
            created: 7,
        }];

        let json: serde_json::Value =
            serde_json::from_str(&render(&entries, "json").unwrap()).unwrap();
        assert_eq!(json[0]["path"], "/blob/s/trusty/tahr.gz");
        assert_eq!(json[0]["size"], 3);

        let text = render(&entries, "text").unwrap();
        assert!(text.starts_with("/blob/s/trusty/tahr.gz"));
        assert!(text.ends_with("cb00753f45a35e8b"));

        assert!(render(&entries, "yaml").is_err());
        assert_eq!(render(&[], "text").unwrap(), "");
    }
}
