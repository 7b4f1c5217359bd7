//! Documents and field values.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar field value.
///
/// Documents are flat: every field holds one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Absent or explicitly unset value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Text string.
    Text(String),
}

impl Value {
    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// The fields of a document, keyed by name.
pub type Fields = BTreeMap<String, Value>;

/// Identifier of a document within a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Creates a document ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A stored document: its ID and its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document ID.
    pub id: DocId,
    /// Field values.
    pub fields: Fields,
}

impl Document {
    /// Creates a document.
    #[must_use]
    pub fn new(id: DocId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Returns a field value, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a required text field.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if the field is missing or not text.
    pub fn text(&self, field: &str) -> CoreResult<&str> {
        self.opt_text(field)?
            .ok_or_else(|| self.invalid(format!("missing text field {field:?}")))
    }

    /// Returns an optional text field; missing and null both read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if the field holds a non-text value.
    pub fn opt_text(&self, field: &str) -> CoreResult<Option<&str>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Text(s)) => Ok(Some(s)),
            Some(other) => Err(self.invalid(format!("field {field:?} is not text: {other:?}"))),
        }
    }

    /// Returns a required integer field.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if the field is missing or not an integer.
    pub fn int(&self, field: &str) -> CoreResult<i64> {
        self.opt_int(field)?
            .ok_or_else(|| self.invalid(format!("missing integer field {field:?}")))
    }

    /// Returns an optional integer field; missing and null both read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDocument`] if the field holds a non-integer value.
    pub fn opt_int(&self, field: &str) -> CoreResult<Option<i64>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(self.invalid(format!(
                "field {field:?} is not an integer: {other:?}"
            ))),
        }
    }

    fn invalid(&self, message: String) -> CoreError {
        CoreError::invalid_document(self.id.as_str(), message)
    }
}

/// An equality filter over document fields.
///
/// A document matches when every listed field equals the given value. A
/// condition on [`Value::Null`] also matches documents lacking the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Fields,
}

impl Filter {
    /// A filter matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.into(), value.into());
        self
    }

    /// Returns true if `fields` satisfies every condition.
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        self.conditions
            .iter()
            .all(|(name, want)| fields.get(name).unwrap_or(&Value::Null) == want)
    }

    /// Returns true if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
