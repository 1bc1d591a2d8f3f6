//! Query composition
//!
//! [`extend`] merges two structurally typed fragments without touching
//! either input. [`build_terms`] turns optional per-field constraints into a
//! bool fragment that can be merged into a collection's query.

use crate::query::types::SearchQuery;
use serde_json::{json, Map, Value};

/// Merge `addition` into a deep copy of `base`.
///
/// Objects merge key by key, arrays append the elements they do not already
/// contain, anything else is replaced by the addition.
pub fn extend(base: &Value, addition: &Value) -> Value {
    let mut merged = base.clone();
    merge(&mut merged, addition);
    merged
}

fn merge(target: &mut Value, addition: &Value) {
    match (target, addition) {
        (Value::Object(target), Value::Object(addition)) => {
            for (key, value) in addition {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(items), Value::Array(extra)) => {
            for item in extra {
                if !items.contains(item) {
                    items.push(item.clone());
                }
            }
        }
        (target, addition) => *target = addition.clone(),
    }
}

/// Constraint on one metadata field
#[derive(Debug, Clone, PartialEq)]
pub enum TermFilter {
    /// Field must hold one of these values
    Values(Vec<Value>),
    /// Field must (true) or must not (false) be present
    Exists(bool),
}

impl TermFilter {
    pub fn values<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        TermFilter::Values(values.into_iter().map(Into::into).collect())
    }
}

impl From<bool> for TermFilter {
    fn from(exists: bool) -> Self {
        TermFilter::Exists(exists)
    }
}

impl From<&str> for TermFilter {
    fn from(value: &str) -> Self {
        TermFilter::Values(vec![Value::from(value)])
    }
}

impl From<String> for TermFilter {
    fn from(value: String) -> Self {
        TermFilter::Values(vec![Value::from(value)])
    }
}

impl From<i64> for TermFilter {
    fn from(value: i64) -> Self {
        TermFilter::Values(vec![Value::from(value)])
    }
}

impl From<i32> for TermFilter {
    fn from(value: i32) -> Self {
        TermFilter::Values(vec![Value::from(value)])
    }
}

impl From<u32> for TermFilter {
    fn from(value: u32) -> Self {
        TermFilter::Values(vec![Value::from(value)])
    }
}

impl<T: Into<Value>> From<Vec<T>> for TermFilter {
    fn from(values: Vec<T>) -> Self {
        TermFilter::values(values)
    }
}

impl From<&[&str]> for TermFilter {
    fn from(values: &[&str]) -> Self {
        TermFilter::values(values.iter().copied())
    }
}

/// Build a bool fragment from `(field, constraint)` pairs.
///
/// Absent constraints are skipped. Value constraints become `terms` clauses
/// under `must`; existence constraints become `exists` clauses under `must`
/// or `must_not`.
pub fn build_terms(fields: &[(&str, Option<&TermFilter>)]) -> SearchQuery {
    let mut must = Vec::new();
    let mut must_not = Vec::new();

    for (field, filter) in fields {
        match filter {
            None => {}
            Some(TermFilter::Values(values)) => {
                must.push(json!({"terms": {*field: values}}));
            }
            Some(TermFilter::Exists(true)) => {
                must.push(json!({"exists": {"field": field}}));
            }
            Some(TermFilter::Exists(false)) => {
                must_not.push(json!({"exists": {"field": field}}));
            }
        }
    }

    SearchQuery::new(bool_query(must, must_not, Vec::new(), None))
}

/// Assemble a bool query, leaving out empty occurrences
pub fn bool_query(
    must: Vec<Value>,
    must_not: Vec<Value>,
    should: Vec<Value>,
    minimum_should_match: Option<u32>,
) -> Value {
    let mut body = Map::new();

    if !must.is_empty() {
        body.insert("must".to_string(), Value::Array(must));
    }
    if !must_not.is_empty() {
        body.insert("must_not".to_string(), Value::Array(must_not));
    }
    if !should.is_empty() {
        body.insert("should".to_string(), Value::Array(should));
    }
    if let Some(n) = minimum_should_match {
        body.insert("minimum_should_match".to_string(), json!(n));
    }

    json!({ "bool": body })
}
