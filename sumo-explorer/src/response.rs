//! Search response envelope

use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// `/search` response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: HitsResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<HashMap<String, AggregationResult>>,
}

impl SearchResponse {
    /// Buckets of a named top-level aggregation
    pub fn buckets(&self, name: &str) -> Result<&[Bucket]> {
        self.aggregations
            .as_ref()
            .and_then(|aggs| aggs.get(name))
            .map(|agg| agg.buckets.as_slice())
            .ok_or_else(|| {
                ExplorerError::MalformedResponse(format!("missing aggregation '{}'", name))
            })
    }

    /// Total hit count, when the request asked for it
    pub fn total(&self) -> Option<usize> {
        self.hits.total.as_ref().map(|t| t.value as usize)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalHits {
    pub value: u64,
    #[serde(default)]
    pub relation: Option<String>,
}

/// One search hit as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: Value,
    /// Sort key used as the next page's `search_after`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub key: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    /// Nested aggregation results, keyed by aggregation name
    #[serde(flatten)]
    pub sub_aggs: HashMap<String, Value>,
}

impl Bucket {
    /// Buckets of a nested aggregation
    pub fn sub_buckets(&self, name: &str) -> Result<Vec<Bucket>> {
        let nested = self.sub_aggs.get(name).ok_or_else(|| {
            ExplorerError::MalformedResponse(format!("missing nested aggregation '{}'", name))
        })?;
        let result: AggregationResult = serde_json::from_value(nested.clone())?;
        Ok(result.buckets)
    }

    /// `key_as_string` when present (dates), the raw key otherwise
    pub fn display_key(&self) -> Value {
        match &self.key_as_string {
            Some(s) => Value::String(s.clone()),
            None => self.key.clone(),
        }
    }
}
