//! Search request types
//!
//! These types represent the subset of the Query DSL envelope the explorer
//! sends to `/search`. Query fragments themselves stay structurally typed
//! (`serde_json::Value`) so they can be merged field by field.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A boolean query or leaf fragment in the search dialect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchQuery(Value);

impl SearchQuery {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// `{"bool": {}}`, the neutral element of [`SearchQuery::extend`]
    pub fn empty() -> Self {
        Self(json!({"bool": {}}))
    }

    /// Bool query with the given `must` clauses
    pub fn must(clauses: Vec<Value>) -> Self {
        Self(json!({"bool": {"must": clauses}}))
    }

    /// Bool query requiring an exact term
    pub fn term(field: &str, value: impl Into<Value>) -> Self {
        Self::must(vec![json!({"term": {field: value.into()}})])
    }

    /// Merge `addition` into a copy of this query
    pub fn extend(&self, addition: &SearchQuery) -> SearchQuery {
        SearchQuery(crate::query::builder::extend(
            &as_bool(&self.0),
            &as_bool(&addition.0),
        ))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Clauses of one bool occurrence (`must`, `must_not`, `should`)
    pub fn clauses(&self, occurrence: &str) -> &[Value] {
        self.0
            .get("bool")
            .and_then(|b| b.get(occurrence))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for SearchQuery {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Leaf fragments are wrapped so sibling keys never land next to a leaf.
fn as_bool(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.len() == 1 && map.contains_key("bool") => value.clone(),
        Value::Object(map) if map.is_empty() => json!({"bool": {}}),
        other => json!({"bool": {"must": [other.clone()]}}),
    }
}

/// Root search request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The query to execute
    pub query: SearchQuery,

    /// Maximum number of results
    pub size: usize,

    /// Sort order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortClause>,

    /// Sort key of the last hit of the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Vec<Value>>,

    /// Track total hits exactly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_total_hits: Option<bool>,

    /// Fields to return in _source
    #[serde(default, rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<Vec<String>>,

    /// Aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggs: Option<BTreeMap<String, Aggregation>>,
}

impl SearchRequest {
    pub fn new(query: SearchQuery, size: usize) -> Self {
        Self {
            query,
            size,
            ..Default::default()
        }
    }

    /// Zero-size request that only counts matching documents
    pub fn count(query: SearchQuery) -> Self {
        Self {
            track_total_hits: Some(true),
            ..Self::new(query, 0)
        }
    }

    /// Zero-size request carrying one named aggregation
    pub fn aggregation(query: SearchQuery, name: &str, aggregation: Aggregation) -> Self {
        let mut aggs = BTreeMap::new();
        aggs.insert(name.to_string(), aggregation);
        Self {
            aggs: Some(aggs),
            ..Self::new(query, 0)
        }
    }

    pub fn sorted_desc(mut self, field: &str) -> Self {
        self.sort.push(SortClause::desc(field));
        self
    }

    /// Request body as JSON
    pub fn to_value(&self) -> crate::error::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SortClause {
    Field(String),
    Object(BTreeMap<String, SortOrder>),
}

impl SortClause {
    pub fn desc(field: &str) -> Self {
        let mut clause = BTreeMap::new();
        clause.insert(
            field.to_string(),
            SortOrder::Object {
                order: "desc".to_string(),
            },
        );
        SortClause::Object(clause)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SortOrder {
    Simple(String),
    Object { order: String },
}

/// Bucket aggregation request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Aggregation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<TermsAgg>,

    // Nested aggregations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggs: Option<BTreeMap<String, Aggregation>>,
}

impl Aggregation {
    pub fn terms(field: &str, size: usize) -> Self {
        Self {
            terms: Some(TermsAgg {
                field: field.to_string(),
                size: Some(size),
            }),
            aggs: None,
        }
    }

    /// Attach a nested aggregation under `name`
    pub fn with_sub(mut self, name: &str, sub: Aggregation) -> Self {
        self.aggs
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), sub);
        self
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TermsAgg {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}
