//! Conditional document operations.

use crate::document::{DocId, Fields, Value};

/// Precondition on the current state of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assert {
    /// The document must not exist. Implied by [`Op::Insert`]; rejected on
    /// updates and removals.
    Missing,
    /// The document must exist.
    Exists,
    /// The document must exist and every listed field must equal the given
    /// value. A [`Value::Null`] entry also accepts an absent field.
    Matches(Fields),
}

impl Assert {
    /// Asserts a single field value.
    #[must_use]
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = Fields::new();
        fields.insert(field.into(), value.into());
        Self::Matches(fields)
    }

    /// Evaluates the precondition against the current document, if any.
    #[must_use]
    pub fn holds(&self, current: Option<&Fields>) -> bool {
        match (self, current) {
            (Self::Missing, current) => current.is_none(),
            (Self::Exists, current) => current.is_some(),
            (Self::Matches(_), None) => false,
            (Self::Matches(want), Some(fields)) => want
                .iter()
                .all(|(name, value)| fields.get(name).unwrap_or(&Value::Null) == value),
        }
    }
}

/// One step of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Creates a document that must not already exist.
    Insert {
        /// Target collection.
        collection: String,
        /// Target document.
        id: DocId,
        /// Initial fields.
        fields: Fields,
    },
    /// Modifies an existing document.
    Update {
        /// Target collection.
        collection: String,
        /// Target document.
        id: DocId,
        /// Precondition.
        assert: Assert,
        /// Fields to set.
        set: Fields,
        /// Field names to remove.
        unset: Vec<String>,
    },
    /// Deletes an existing document.
    Remove {
        /// Target collection.
        collection: String,
        /// Target document.
        id: DocId,
        /// Precondition.
        assert: Assert,
    },
}

impl Op {
    /// Builds an insert.
    pub fn insert(collection: impl Into<String>, id: impl Into<DocId>, fields: Fields) -> Self {
        Self::Insert {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    /// Builds an update that sets `set` and removes nothing.
    pub fn update(
        collection: impl Into<String>,
        id: impl Into<DocId>,
        assert: Assert,
        set: Fields,
    ) -> Self {
        Self::Update {
            collection: collection.into(),
            id: id.into(),
            assert,
            set,
            unset: Vec::new(),
        }
    }

    /// Builds a removal.
    pub fn remove(collection: impl Into<String>, id: impl Into<DocId>, assert: Assert) -> Self {
        Self::Remove {
            collection: collection.into(),
            id: id.into(),
            assert,
        }
    }

    /// Collection the operation targets.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::Insert { collection, .. }
            | Self::Update { collection, .. }
            | Self::Remove { collection, .. } => collection,
        }
    }

    /// Document the operation targets.
    #[must_use]
    pub fn id(&self) -> &DocId {
        match self {
            Self::Insert { id, .. } | Self::Update { id, .. } | Self::Remove { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertions() {
        let mut doc = Fields::new();
        doc.insert("blobpath".into(), "a".into());

        assert!(Assert::Missing.holds(None));
        assert!(!Assert::Missing.holds(Some(&doc)));
        assert!(Assert::Exists.holds(Some(&doc)));
        assert!(!Assert::Exists.holds(None));
        assert!(Assert::field_eq("blobpath", "a").holds(Some(&doc)));
        assert!(!Assert::field_eq("blobpath", "b").holds(Some(&doc)));
        assert!(!Assert::field_eq("blobpath", "a").holds(None));
        assert!(Assert::field_eq("other", Value::Null).holds(Some(&doc)));
    }

    #[test]
    fn accessors() {
        let op = Op::remove("resources", "ns:/x", Assert::Exists);
        assert_eq!(op.collection(), "resources");
        assert_eq!(op.id().as_str(), "ns:/x");
    }
}
