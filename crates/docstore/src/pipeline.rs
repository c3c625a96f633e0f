//! Multi-stage aggregation pipeline.
//!
//! A `Pipeline` is an ordered list of stages (match, lookup, unwind,
//! computed fields, sort, limit, unset, restrict) that a collection
//! evaluates in one call.

use crate::error::Result;
use crate::filter::Filter;
use crate::query::{Projection, SortSpec};
use crate::types::{get_path, remove_path, set_path, Document};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Computes derived fields for a document during an `AddFields` stage.
///
/// Implementations must be pure: the same document always yields the same
/// fields. They run in parallel across documents.
pub trait FieldComputer: Send + Sync {
    /// Returns the name of this computer (for logging/debugging)
    fn name(&self) -> &str;

    /// Field path / value pairs to set on the document.
    fn compute(&self, doc: &Document) -> Vec<(String, Value)>;
}

/// Gives lookup stages access to the documents of other collections.
pub trait LookupSource {
    fn documents(&self, collection: &str) -> Result<Vec<Document>>;
}

#[derive(Clone)]
pub enum Stage {
    /// Keep documents matching the filter
    Match(Filter),
    /// Left outer join: array of `from` documents whose `foreign_field`
    /// equals this document's `local_field`, stored at `as_field`
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// One output document per element of the array at `path`
    Unwind { path: String, preserve_empty: bool },
    AddFields(Arc<dyn FieldComputer>),
    Sort(SortSpec),
    Limit(usize),
    /// Drop the listed paths
    Unset(Vec<String>),
    /// Reduce the embedded document at `path` to the listed fields
    Restrict { path: String, keep: Vec<String> },
}

impl Stage {
    pub fn lookup(
        from: impl Into<String>,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Stage::Lookup {
            from: from.into(),
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
        }
    }

    pub fn unwind(path: impl Into<String>, preserve_empty: bool) -> Self {
        Stage::Unwind {
            path: path.into(),
            preserve_empty,
        }
    }

    pub fn unset<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Stage::Unset(paths.into_iter().map(Into::into).collect())
    }

    pub fn restrict<I, S>(path: impl Into<String>, keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Stage::Restrict {
            path: path.into(),
            keep: keep.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Stage::Match(_) => "match",
            Stage::Lookup { .. } => "lookup",
            Stage::Unwind { .. } => "unwind",
            Stage::AddFields(computer) => computer.name(),
            Stage::Sort(_) => "sort",
            Stage::Limit(_) => "limit",
            Stage::Unset(_) => "unset",
            Stage::Restrict { .. } => "restrict",
        }
    }

    fn apply(&self, docs: Vec<Document>, source: &dyn LookupSource) -> Result<Vec<Document>> {
        let docs = match self {
            Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                as_field,
            } => {
                let foreign = source.documents(from)?;
                let mut by_key: HashMap<String, Vec<Value>> = HashMap::new();
                for doc in foreign {
                    if let Some(key) = get_path(&doc, foreign_field).map(join_key) {
                        by_key.entry(key).or_default().push(Value::Object(doc));
                    }
                }
                docs.into_iter()
                    .map(|mut doc| {
                        let joined = get_path(&doc, local_field)
                            .map(join_key)
                            .and_then(|key| by_key.get(&key).cloned())
                            .unwrap_or_default();
                        set_path(&mut doc, as_field, Value::Array(joined));
                        doc
                    })
                    .collect()
            }
            Stage::Unwind {
                path,
                preserve_empty,
            } => {
                let mut out = Vec::with_capacity(docs.len());
                for mut doc in docs {
                    match get_path(&doc, path).cloned() {
                        Some(Value::Array(items)) if !items.is_empty() => {
                            for item in items {
                                let mut copy = doc.clone();
                                set_path(&mut copy, path, item);
                                out.push(copy);
                            }
                        }
                        Some(Value::Array(_)) | Some(Value::Null) | None => {
                            if *preserve_empty {
                                remove_path(&mut doc, path);
                                out.push(doc);
                            }
                        }
                        Some(_) => out.push(doc),
                    }
                }
                out
            }
            Stage::AddFields(computer) => {
                let mut docs = docs;
                docs.par_iter_mut().for_each(|doc| {
                    for (path, value) in computer.compute(doc) {
                        set_path(doc, &path, value);
                    }
                });
                docs
            }
            Stage::Sort(spec) => {
                let mut docs = docs;
                spec.sort(&mut docs);
                docs
            }
            Stage::Limit(n) => {
                let mut docs = docs;
                docs.truncate(*n);
                docs
            }
            Stage::Unset(paths) => {
                let projection = Projection::Exclude(paths.clone());
                docs.into_iter().map(|d| projection.apply(d)).collect()
            }
            Stage::Restrict { path, keep } => {
                let projection = Projection::restrict(path.clone(), keep.clone());
                docs.into_iter().map(|d| projection.apply(d)).collect()
            }
        };
        Ok(docs)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Match(filter) => f.debug_tuple("Match").field(filter).finish(),
            Stage::Lookup {
                from,
                local_field,
                foreign_field,
                as_field,
            } => f
                .debug_struct("Lookup")
                .field("from", from)
                .field("local_field", local_field)
                .field("foreign_field", foreign_field)
                .field("as_field", as_field)
                .finish(),
            Stage::Unwind {
                path,
                preserve_empty,
            } => f
                .debug_struct("Unwind")
                .field("path", path)
                .field("preserve_empty", preserve_empty)
                .finish(),
            Stage::AddFields(computer) => f.debug_tuple("AddFields").field(&computer.name()).finish(),
            Stage::Sort(spec) => f.debug_tuple("Sort").field(spec).finish(),
            Stage::Limit(n) => f.debug_tuple("Limit").field(n).finish(),
            Stage::Unset(paths) => f.debug_tuple("Unset").field(paths).finish(),
            Stage::Restrict { path, keep } => f
                .debug_struct("Restrict")
                .field("path", path)
                .field("keep", keep)
                .finish(),
        }
    }
}

/// Strings join by content; other values by their JSON text.
fn join_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Chains stages together into an aggregation pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = Pipeline::new()
///     .add_stage(Stage::Match(Filter::eq("adopted", false)))
///     .add_stage(Stage::Sort(SortSpec::desc("created_at")))
///     .add_stage(Stage::Limit(12));
///
/// let docs = collection.aggregate(&pipeline).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Add a stage to the pipeline (builder pattern).
    pub fn add_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Evaluate all stages in order over an in-memory document set.
    pub fn run(&self, docs: Vec<Document>, source: &dyn LookupSource) -> Result<Vec<Document>> {
        let mut current = docs;
        for stage in &self.stages {
            tracing::debug!(
                "Applying stage: {} (input count: {})",
                stage.name(),
                current.len()
            );
            current = stage.apply(current, source)?;
            tracing::debug!(
                "Stage applied: {} (output count: {})",
                stage.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;

    struct Users(Vec<Document>);

    impl LookupSource for Users {
        fn documents(&self, collection: &str) -> Result<Vec<Document>> {
            match collection {
                "users" => Ok(self.0.clone()),
                other => Err(StoreError::UnknownCollection(other.to_string())),
            }
        }
    }

    struct Doubler;

    impl FieldComputer for Doubler {
        fn name(&self) -> &str {
            "Doubler"
        }

        fn compute(&self, doc: &Document) -> Vec<(String, Value)> {
            let n = doc.get("n").and_then(Value::as_i64).unwrap_or(0);
            vec![("double".to_string(), json!(n * 2))]
        }
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn users() -> Users {
        Users(vec![doc(json!({
            "_id": "u1",
            "name": "Ana",
            "email": "ana@example.com",
            "password": "hash"
        }))])
    }

    #[test]
    fn test_empty_pipeline() {
        let docs = vec![doc(json!({ "n": 1 })), doc(json!({ "n": 2 }))];
        let out = Pipeline::new().run(docs.clone(), &users()).unwrap();
        assert_eq!(out, docs);
    }

    #[test]
    fn test_lookup_unwind_restrict() {
        let docs = vec![
            doc(json!({ "_id": "p1", "added_by": { "_id": "u1" } })),
            doc(json!({ "_id": "p2", "added_by": { "_id": "gone" } })),
        ];
        let pipeline = Pipeline::new()
            .add_stage(Stage::lookup("users", "added_by._id", "_id", "added_by"))
            .add_stage(Stage::unwind("added_by", true))
            .add_stage(Stage::restrict("added_by", ["_id", "name"]));

        let out = pipeline.run(docs, &users()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(
            Value::Object(out[0].clone()),
            json!({ "_id": "p1", "added_by": { "_id": "u1", "name": "Ana" } })
        );
        assert!(out[1].get("added_by").is_none());
    }

    #[test]
    fn test_unwind_without_preserve_drops_empty() {
        let docs = vec![doc(json!({ "tags": [] })), doc(json!({ "tags": ["a", "b"] }))];
        let out = Pipeline::new()
            .add_stage(Stage::unwind("tags", false))
            .run(docs, &users())
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["tags"], json!("a"));
    }

    #[test]
    fn test_add_fields_sort_limit_unset() {
        let docs = vec![
            doc(json!({ "n": 1 })),
            doc(json!({ "n": 3 })),
            doc(json!({ "n": 2 })),
        ];
        let pipeline = Pipeline::new()
            .add_stage(Stage::AddFields(Arc::new(Doubler)))
            .add_stage(Stage::Sort(SortSpec::desc("double")))
            .add_stage(Stage::Limit(2))
            .add_stage(Stage::unset(["double"]));

        let out = pipeline.run(docs, &users()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(Value::Object(out[0].clone()), json!({ "n": 3 }));
        assert_eq!(Value::Object(out[1].clone()), json!({ "n": 2 }));
    }

    #[test]
    fn test_lookup_unknown_collection_fails() {
        let pipeline = Pipeline::new().add_stage(Stage::lookup("owners", "a", "_id", "b"));
        let result = pipeline.run(vec![doc(json!({ "a": 1 }))], &users());
        assert!(matches!(result, Err(StoreError::UnknownCollection(_))));
    }
}
