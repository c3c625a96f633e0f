//! Projection, sort and find options shared by `find` and the pipeline.

use crate::types::{compare_values, get_path, remove_path, set_path, Document};
use serde_json::Value;
use std::cmp::Ordering;

/// Which fields of a document to return.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Allow-list: keep only these paths (plus `_id`)
    Include(Vec<String>),
    /// Deny-list: drop these paths
    Exclude(Vec<String>),
    /// Allow-list on the embedded document at `path`; the rest of the
    /// document is untouched and a non-object value at `path` is dropped
    Restrict { path: String, keep: Vec<String> },
}

impl Projection {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include(fields.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    pub fn restrict<I, S>(path: impl Into<String>, keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Restrict {
            path: path.into(),
            keep: keep.into_iter().map(Into::into).collect(),
        }
    }

    pub fn apply(&self, mut doc: Document) -> Document {
        match self {
            Projection::Include(fields) => {
                let mut projected = Document::new();
                if let Some(id) = doc.get("_id") {
                    projected.insert("_id".to_string(), id.clone());
                }
                for field in fields {
                    if let Some(value) = get_path(&doc, field) {
                        set_path(&mut projected, field, value.clone());
                    }
                }
                projected
            }
            Projection::Exclude(fields) => {
                for field in fields {
                    remove_path(&mut doc, field);
                }
                doc
            }
            Projection::Restrict { path, keep } => {
                if let Some(Value::Object(inner)) = remove_path(&mut doc, path) {
                    let inner = Projection::Include(keep.clone()).apply(inner);
                    set_path(&mut doc, path, Value::Object(inner));
                }
                doc
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Multi-key sort specification, applied left to right.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortSpec {
    keys: Vec<(String, SortOrder)>,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self::default().then_asc(field)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::default().then_desc(field)
    }

    pub fn then_asc(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), SortOrder::Ascending));
        self
    }

    pub fn then_desc(mut self, field: impl Into<String>) -> Self {
        self.keys.push((field.into(), SortOrder::Descending));
        self
    }

    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.keys
    }

    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.keys {
            let ordering = compare_values(get_path(a, field), get_path(b, field));
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort; equal keys keep their incoming order.
    pub fn sort(&self, docs: &mut [Document]) {
        if !self.keys.is_empty() {
            docs.sort_by(|a, b| self.compare(a, b));
        }
    }
}

/// Options for `Collection::find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub projection: Option<Projection>,
    pub sort: Option<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_include_keeps_id_and_listed_paths() {
        let d = doc(json!({
            "_id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "password": "hash"
        }));
        let projected = Projection::include(["name"]).apply(d);
        assert_eq!(Value::Object(projected), json!({ "_id": "u1", "name": "Ana" }));
    }

    #[test]
    fn test_exclude_nested() {
        let d = doc(json!({ "a": { "b": 1, "c": 2 }, "d": 3 }));
        let projected = Projection::exclude(["a.b", "d"]).apply(d);
        assert_eq!(Value::Object(projected), json!({ "a": { "c": 2 } }));
    }

    #[test]
    fn test_restrict_nested_allow_list() {
        let d = doc(json!({
            "_id": "p1",
            "name": "Rex",
            "added_by": { "_id": "u1", "name": "Ana", "phone": "555", "email": "a@b.c" }
        }));
        let projected = Projection::restrict("added_by", ["name"]).apply(d);
        assert_eq!(
            Value::Object(projected),
            json!({ "_id": "p1", "name": "Rex", "added_by": { "_id": "u1", "name": "Ana" } })
        );
    }

    #[test]
    fn test_restrict_drops_non_object_and_ignores_missing() {
        let scalar = doc(json!({ "_id": "p1", "added_by": "u1" }));
        let projected = Projection::restrict("added_by", ["name"]).apply(scalar);
        assert_eq!(Value::Object(projected), json!({ "_id": "p1" }));

        let missing = doc(json!({ "_id": "p2" }));
        let projected = Projection::restrict("added_by", ["name"]).apply(missing);
        assert_eq!(Value::Object(projected), json!({ "_id": "p2" }));
    }

    #[test]
    fn test_sort_desc_with_tiebreak() {
        let mut docs = vec![
            doc(json!({ "id": 1, "score": 5, "created_at": 10 })),
            doc(json!({ "id": 2, "score": 7, "created_at": 1 })),
            doc(json!({ "id": 3, "score": 5, "created_at": 20 })),
        ];
        SortSpec::desc("score").then_desc("created_at").sort(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
