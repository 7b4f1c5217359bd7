//! Logical resource paths.
//!
//! ```text
//! /<type>/<owner>[/<stream>]/<series>/<pathname>[/<revision>]
//!
//! type   = "blob" | "zip"
//! owner  = "s" | "u/" user | "org/" org
//! ```
//!
//! Segments use `[A-Za-z0-9._+~-]` and are never `.` or `..`. A purely
//! numeric trailing segment is always the revision, so a pathname cannot be
//! numeric. Three trailing segments read as `stream/series/pathname` unless
//! the last one is numeric, in which case they read as
//! `series/pathname/revision`.

use crate::error::{ResourceError, ResourceResult};
use std::fmt;
use std::str::FromStr;

/// The kind of payload a resource holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    /// An opaque binary.
    Blob,
    /// A zip archive.
    Zip,
}

impl ResourceType {
    /// The path and record spelling of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ResourceError;

    fn from_str(s: &str) -> ResourceResult<Self> {
        match s {
            "blob" => Ok(Self::Blob),
            "zip" => Ok(Self::Zip),
            other => Err(ResourceError::invalid_path(
                other,
                "type must be \"blob\" or \"zip\"",
            )),
        }
    }
}

/// Who a resource belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Owner {
    /// Shared by everyone (`s`).
    Shared,
    /// Owned by a user (`u/<user>`).
    User(String),
    /// Owned by an organization (`org/<org>`).
    Org(String),
}

impl Owner {
    /// The owning user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::User(user) => Some(user),
            _ => None,
        }
    }

    /// The owning organization, if any.
    #[must_use]
    pub fn org(&self) -> Option<&str> {
        match self {
            Self::Org(org) => Some(org),
            _ => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shared => f.write_str("s"),
            Self::User(user) => write!(f, "u/{user}"),
            Self::Org(org) => write!(f, "org/{org}"),
        }
    }
}

/// A parsed resource path.
///
/// The [`Display`](fmt::Display) form is canonical and parses back to an
/// equal value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourcePath {
    kind: ResourceType,
    owner: Owner,
    stream: Option<String>,
    series: String,
    name: String,
    revision: Option<u32>,
}

impl ResourcePath {
    /// Parses a path string.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidPath`] if `path` does not follow the
    /// path grammar.
    pub fn parse(path: &str) -> ResourceResult<Self> {
        let invalid = |reason: &str| ResourceError::invalid_path(path, reason);

        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;
        let segments: Vec<&str> = rest.split('/').collect();
        for segment in &segments {
            check_segment(segment).map_err(|reason| invalid(reason.as_str()))?;
        }

        let (kind, after_kind) = segments
            .split_first()
            .ok_or_else(|| invalid("missing type"))?;
        let kind = ResourceType::from_str(kind)
            .map_err(|_| invalid("type must be \"blob\" or \"zip\""))?;

        let (owner, tail) = match after_kind {
            ["s", tail @ ..] => (Owner::Shared, tail),
            ["u", user, tail @ ..] => (Owner::User((*user).to_string()), tail),
            ["org", org, tail @ ..] => (Owner::Org((*org).to_string()), tail),
            _ => return Err(invalid("owner must be \"s\", \"u/<user>\" or \"org/<org>\"")),
        };

        let (stream, series, name, revision) = match tail {
            [series, name] => (None, *series, *name, None),
            [a, b, c] if is_numeric(c) => (None, *a, *b, Some(*c)),
            [stream, series, name] => (Some(*stream), *series, *name, None),
            [stream, series, name, revision] => {
                if !is_numeric(revision) {
                    return Err(invalid("revision must be a number"));
                }
                (Some(*stream), *series, *name, Some(*revision))
            }
            _ => return Err(invalid("expected [stream/]series/pathname[/revision]")),
        };

        if is_numeric(name) {
            return Err(invalid("pathname must not be purely numeric"));
        }
        let revision = revision
            .map(|r| {
                parse_revision(r).ok_or_else(|| invalid("revision out of range or zero-padded"))
            })
            .transpose()?;

        Ok(Self {
            kind,
            owner,
            stream: stream.map(str::to_string),
            series: series.to_string(),
            name: name.to_string(),
            revision,
        })
    }

    /// Assembles a path from its parts, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidPath`] if a part is not a valid
    /// segment or the pathname is numeric.
    pub fn from_parts(
        kind: ResourceType,
        owner: Owner,
        stream: Option<String>,
        series: impl Into<String>,
        name: impl Into<String>,
        revision: Option<u32>,
    ) -> ResourceResult<Self> {
        let path = Self {
            kind,
            owner,
            stream,
            series: series.into(),
            name: name.into(),
            revision,
        };
        // Re-parsing the canonical form applies every grammar rule at once.
        let canonical = path.to_string();
        let reparsed = Self::parse(&canonical)?;
        if reparsed != path {
            return Err(ResourceError::invalid_path(
                canonical,
                "parts do not form an unambiguous path",
            ));
        }
        Ok(path)
    }

    /// Resource type.
    #[must_use]
    pub const fn kind(&self) -> ResourceType {
        self.kind
    }

    /// Owner.
    #[must_use]
    pub const fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Release stream, if any.
    #[must_use]
    pub fn stream(&self) -> Option<&str> {
        self.stream.as_deref()
    }

    /// Series.
    #[must_use]
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Pathname: the final name of the resource.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Revision, if any.
    #[must_use]
    pub const fn revision(&self) -> Option<u32> {
        self.revision
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.kind, self.owner)?;
        if let Some(stream) = &self.stream {
            write!(f, "/{stream}")?;
        }
        write!(f, "/{}/{}", self.series, self.name)?;
        if let Some(revision) = self.revision {
            write!(f, "/{revision}")?;
        }
        Ok(())
    }
}

impl FromStr for ResourcePath {
    type Err = ResourceError;

    fn from_str(s: &str) -> ResourceResult<Self> {
        Self::parse(s)
    }
}

fn check_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("empty segment".to_string());
    }
    if segment == "." || segment == ".." {
        return Err(format!("segment {segment:?} is not allowed"));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '~' | '-')))
    {
        return Err(format!("segment {segment:?} contains {c:?}"));
    }
    Ok(())
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn parse_revision(segment: &str) -> Option<u32> {
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}
