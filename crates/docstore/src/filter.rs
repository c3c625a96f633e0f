//! Predicates restricting which documents are counted, fetched or ranked.

use crate::types::{get_path, Document};
use serde_json::Value;

/// A composable document predicate.
///
/// ## Usage
/// ```ignore
/// let filter = Filter::eq("adopted", false)
///     .and(Filter::any_of("category", ["dog", "cat"]))
///     .and(Filter::contains_ignore_case("location", "dhaka"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals the value
    Eq(String, Value),
    /// Field equals one of the values; an empty set matches nothing
    In(String, Vec<Value>),
    /// Field is a string containing the needle, ignoring case
    ContainsIgnoreCase(String, String),
    /// Field presence (`true`) or absence (`false`)
    Exists(String, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn any_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn contains_ignore_case(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::ContainsIgnoreCase(field.into(), needle.into())
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Filter::Exists(field.into(), false)
    }

    /// Conjoin with another filter, flattening nested `And`s.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::Or(mut left), f) => {
                left.push(f);
                Filter::Or(left)
            }
            (a, b) => Filter::Or(vec![a, b]),
        }
    }

    /// Evaluate the predicate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, expected) => get_path(doc, field)
                .map(|actual| values_equal(actual, expected))
                .unwrap_or(false),
            Filter::In(field, candidates) => get_path(doc, field)
                .map(|actual| candidates.iter().any(|c| values_equal(actual, c)))
                .unwrap_or(false),
            Filter::ContainsIgnoreCase(field, needle) => get_path(doc, field)
                .and_then(Value::as_str)
                .map(|s| contains_ignore_case(s, needle))
                .unwrap_or(false),
            Filter::Exists(field, present) => get_path(doc, field).is_some() == *present,
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

/// Case-insensitive substring test; the needle is literal text.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Numbers compare by value so that `1` and `1.0` are equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}
