//! Collection tables and batch staging shared by the document stores.

use crate::document::{DocId, Document, Fields, Filter};
use crate::error::{CoreError, CoreResult};
use crate::op::{Assert, Op};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The net effect of a batch on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Change {
    pub collection: String,
    pub id: DocId,
    /// New contents; `None` deletes the document.
    pub fields: Option<Fields>,
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    collections: BTreeMap<String, BTreeMap<DocId, Fields>>,
}

impl Tables {
    pub fn get(&self, collection: &str, id: &DocId) -> Option<&Fields> {
        self.collections.get(collection)?.get(id)
    }

    pub fn find(&self, collection: &str, filter: &Filter) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| filter.matches(fields))
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.collections.values().map(BTreeMap::len).sum()
    }

    /// Evaluates a batch without touching the tables.
    ///
    /// Returns the changes to install, one per touched document.
    pub fn stage(&self, ops: &[Op]) -> CoreResult<Vec<Change>> {
        let mut overlay: BTreeMap<(String, DocId), Option<Fields>> = BTreeMap::new();

        for (index, op) in ops.iter().enumerate() {
            let collection = op.collection();
            let id = op.id();
            if collection.is_empty() || id.as_str().is_empty() {
                return Err(CoreError::invalid_operation(format!(
                    "op {index}: empty collection or document id"
                )));
            }

            let key = (collection.to_string(), id.clone());
            let current = match overlay.get(&key) {
                Some(staged) => staged.clone(),
                None => self.get(collection, id).cloned(),
            };

            let next = match op {
                Op::Insert { fields, .. } => {
                    if current.is_some() {
                        return Err(CoreError::aborted(format!(
                            "insert {collection}/{id}: document exists"
                        )));
                    }
                    Some(fields.clone())
                }
                Op::Update {
                    assert, set, unset, ..
                } => {
                    check(assert, current.as_ref(), "update", collection, id)?;
                    let mut fields = current.unwrap_or_default();
                    for (name, value) in set {
                        fields.insert(name.clone(), value.clone());
                    }
                    for name in unset {
                        fields.remove(name);
                    }
                    Some(fields)
                }
                Op::Remove { assert, .. } => {
                    check(assert, current.as_ref(), "remove", collection, id)?;
                    None
                }
            };
            overlay.insert(key, next);
        }

        Ok(overlay
            .into_iter()
            .map(|((collection, id), fields)| Change {
                collection,
                id,
                fields,
            })
            .collect())
    }

    pub fn install(&mut self, changes: Vec<Change>) {
        for change in changes {
            match change.fields {
                Some(fields) => {
                    self.collections
                        .entry(change.collection)
                        .or_default()
                        .insert(change.id, fields);
                }
                None => {
                    if let Some(docs) = self.collections.get_mut(&change.collection) {
                        docs.remove(&change.id);
                        if docs.is_empty() {
                            self.collections.remove(&change.collection);
                        }
                    }
                }
            }
        }
    }
}

fn check(
    assert: &Assert,
    current: Option<&Fields>,
    verb: &str,
    collection: &str,
    id: &DocId,
) -> CoreResult<()> {
    if matches!(assert, Assert::Missing) {
        return Err(CoreError::invalid_operation(format!(
            "{verb} {collection}/{id}: a missing-document assertion is only valid on insert"
        )));
    }
    if !assert.holds(current) {
        return Err(CoreError::aborted(format!(
            "{verb} {collection}/{id}: assertion {assert:?} failed"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Value;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
            .collect()
    }

    fn apply(tables: &mut Tables, ops: &[Op]) -> CoreResult<()> {
        let changes = tables.stage(ops)?;
        tables.install(changes);
        Ok(())
    }

    #[test]
    fn insert_then_duplicate_aborts() {
        let mut tables = Tables::default();
        apply(&mut tables, &[Op::insert("c", "a", fields(&[("k", "1")]))]).unwrap();

        let err = apply(&mut tables, &[Op::insert("c", "a", Fields::new())]).unwrap_err();
        assert!(err.is_aborted());
        assert_eq!(tables.get("c", &DocId::new("a")), Some(&fields(&[("k", "1")])));
    }

    #[test]
    fn failed_batch_changes_nothing() {
        let mut tables = Tables::default();
        let ops = [
            Op::insert("c", "a", Fields::new()),
            Op::remove("c", "missing", Assert::Exists),
        ];
        assert!(apply(&mut tables, &ops).unwrap_err().is_aborted());
        assert_eq!(tables.len(), 0);
    }

    #[test]
    fn later_ops_see_earlier_ones() {
        let mut tables = Tables::default();
        let ops = [
            Op::insert("c", "a", fields(&[("v", "1")])),
            Op::update("c", "a", Assert::field_eq("v", "1"), fields(&[("v", "2")])),
        ];
        apply(&mut tables, &ops).unwrap();
        assert_eq!(tables.get("c", &DocId::new("a")), Some(&fields(&[("v", "2")])));

        let ops = [
            Op::remove("c", "a", Assert::Exists),
            Op::insert("c", "a", fields(&[("v", "3")])),
        ];
        apply(&mut tables, &ops).unwrap();
        assert_eq!(tables.get("c", &DocId::new("a")), Some(&fields(&[("v", "3")])));
    }

    #[test]
    fn update_sets_and_unsets() {
        let mut tables = Tables::default();
        apply(&mut tables, &[Op::insert("c", "a", fields(&[("x", "1"), ("y", "2")]))]).unwrap();

        let op = Op::Update {
            collection: "c".into(),
            id: "a".into(),
            assert: Assert::Exists,
            set: fields(&[("x", "9")]),
            unset: vec!["y".into()],
        };
        apply(&mut tables, &[op]).unwrap();
        assert_eq!(tables.get("c", &DocId::new("a")), Some(&fields(&[("x", "9")])));
    }

    #[test]
    fn missing_assert_on_update_is_invalid() {
        let tables = Tables::default();
        let err = tables
            .stage(&[Op::update("c", "a", Assert::Missing, Fields::new())])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
    }

    #[test]
    fn find_filters_and_orders() {
        let mut tables = Tables::default();
        apply(
            &mut tables,
            &[
                Op::insert("c", "b", fields(&[("series", "trusty")])),
                Op::insert("c", "a", fields(&[("series", "trusty")])),
                Op::insert("c", "z", fields(&[("series", "vivid")])),
                Op::insert("other", "a", fields(&[("series", "trusty")])),
            ],
        )
        .unwrap();

        let found = tables.find("c", &Filter::all().eq("series", "trusty"));
        let ids: Vec<&str> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(tables.find("nope", &Filter::all()).is_empty());
    }
}
