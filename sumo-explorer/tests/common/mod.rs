//! In-memory search backend for integration tests
//!
//! Serves a fixed corpus with the subset of the query dialect the explorer
//! emits: bool (must, must_not, should, minimum_should_match), term, terms,
//! exists and range. Pages are sorted descending on a per-document sequence
//! number which doubles as the search-after key.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;
use sumo_explorer::client::blob_path;
use sumo_explorer::config::PagingConfig;
use sumo_explorer::{Explorer, ExplorerError, Result, SearchClient};

pub const CASE_UUID: &str = "10f41041-2c17-4374-a735-bb0de62e29dc";
pub const OTHER_CASE_UUID: &str = "2c2f47cf-c7ab-4112-87f9-b4797ec51cb6";

struct StoredDoc {
    id: String,
    seq: i64,
    source: Value,
}

#[derive(Default)]
struct Recorded {
    calls: HashMap<String, usize>,
    bodies: Vec<(String, Value)>,
}

/// Search backend holding documents in memory and counting calls per path
pub struct MockSearchClient {
    docs: Vec<StoredDoc>,
    recorded: Mutex<Recorded>,
    aggregate_delay: Duration,
    /// Serve no hits beyond this many, while still reporting the full total
    hit_limit: Option<usize>,
}

impl MockSearchClient {
    pub fn new(sources: Vec<(String, Value)>) -> Self {
        let n = sources.len() as i64;
        let docs = sources
            .into_iter()
            .enumerate()
            .map(|(i, (id, source))| StoredDoc {
                id,
                // Descending sort yields insertion order
                seq: n - i as i64,
                source,
            })
            .collect();

        Self {
            docs,
            recorded: Mutex::new(Recorded::default()),
            aggregate_delay: Duration::from_millis(0),
            hit_limit: None,
        }
    }

    pub fn with_aggregate_delay(mut self, delay: Duration) -> Self {
        self.aggregate_delay = delay;
        self
    }

    pub fn with_hit_limit(mut self, limit: usize) -> Self {
        self.hit_limit = Some(limit);
        self
    }

    pub fn calls(&self, path: &str) -> usize {
        self.recorded.lock().calls.get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.recorded.lock().calls.values().sum()
    }

    /// Request bodies sent to `path`, oldest first
    pub fn bodies(&self, path: &str) -> Vec<Value> {
        self.recorded
            .lock()
            .bodies
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn record(&self, path: &str, body: Option<&Value>) {
        let mut recorded = self.recorded.lock();
        *recorded.calls.entry(path.to_string()).or_default() += 1;
        if let Some(body) = body {
            recorded.bodies.push((path.to_string(), body.clone()));
        }
    }

    fn search(&self, body: &Value) -> Value {
        let query = body.get("query").cloned().unwrap_or_else(|| json!({}));
        let matched: Vec<&StoredDoc> = self.docs.iter().filter(|d| matches(d, &query)).collect();

        let mut response = Map::new();
        let mut hits = Map::new();
        if body.get("track_total_hits") == Some(&json!(true)) {
            hits.insert(
                "total".to_string(),
                json!({"value": matched.len(), "relation": "eq"}),
            );
        }

        let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
        let after = body
            .get("search_after")
            .and_then(|a| a.get(0))
            .and_then(Value::as_i64);
        let id_only = body.get("_source") == Some(&json!(["_id"]));

        let mut ordered = matched.clone();
        ordered.sort_by(|a, b| b.seq.cmp(&a.seq));
        let served: Vec<Value> = ordered
            .iter()
            .take(self.hit_limit.unwrap_or(usize::MAX))
            .filter(|d| after.map_or(true, |after| d.seq < after))
            .take(size)
            .map(|d| {
                json!({
                    "_id": d.id,
                    "_source": if id_only { json!({}) } else { d.source.clone() },
                    "sort": [d.seq],
                })
            })
            .collect();
        hits.insert("hits".to_string(), Value::Array(served));
        response.insert("hits".to_string(), Value::Object(hits));

        if let Some(Value::Object(aggs)) = body.get("aggs") {
            response.insert("aggregations".to_string(), aggregate(&matched, aggs));
        }

        Value::Object(response)
    }

    fn aggregation_body(&self, body: &Value) -> Result<Bytes> {
        let operations: Vec<String> = body
            .get("operation")
            .and_then(Value::as_array)
            .map(|ops| ops.iter().filter_map(|o| o.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        match operations.as_slice() {
            [_] => Ok(Bytes::from(irap_blob())),
            _ => {
                let mut buf = Cursor::new(Vec::new());
                let mut writer = zip::ZipWriter::new(&mut buf);
                let options = zip::write::SimpleFileOptions::default();
                for operation in &operations {
                    writer.start_file(operation.as_str(), options)?;
                    writer
                        .write_all(&irap_blob())
                        .map_err(|e| ExplorerError::Upstream(e.to_string()))?;
                }
                writer.finish()?;
                Ok(Bytes::from(buf.into_inner()))
            }
        }
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn post(&self, path: &str, body: &Value) -> Result<Bytes> {
        self.record(path, Some(body));
        match path {
            "/search" => Ok(Bytes::from(serde_json::to_vec(&self.search(body))?)),
            "/aggregate" => {
                if !self.aggregate_delay.is_zero() {
                    tokio::time::sleep(self.aggregate_delay).await;
                }
                self.aggregation_body(body)
            }
            other => Err(ExplorerError::Status {
                status: 404,
                body: format!("no route {}", other),
            }),
        }
    }

    async fn get(&self, path: &str, _params: &[(String, String)]) -> Result<Value> {
        self.record(path, None);
        Ok(json!({}))
    }

    async fn get_blob(&self, object_id: &str) -> Result<Bytes> {
        self.record(&blob_path(object_id), None);
        Ok(Bytes::from(irap_blob()))
    }
}

/// Smallest valid irap binary header
pub fn irap_blob() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&32i32.to_be_bytes());
    data.extend_from_slice(&(-996i32).to_be_bytes());
    data.extend_from_slice(&[0u8; 24]);
    data.extend_from_slice(&32i32.to_be_bytes());
    data
}

/// Values at a dotted path, flattening arrays on the way
fn field_values(doc: &StoredDoc, field: &str) -> Vec<Value> {
    let field = field.strip_suffix(".keyword").unwrap_or(field);
    if field == "_id" {
        return vec![Value::String(doc.id.clone())];
    }

    let mut current = vec![&doc.source];
    for part in field.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => next.extend(map.get(part)),
                Value::Array(items) => next.extend(items.iter().filter_map(|i| i.get(part))),
                _ => {}
            }
        }
        current = next;
    }

    let mut values = Vec::new();
    for value in current {
        match value {
            Value::Null => {}
            Value::Array(items) => values.extend(items.iter().cloned()),
            other => values.push(other.clone()),
        }
    }
    values
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn matches(doc: &StoredDoc, query: &Value) -> bool {
    let Some((kind, body)) = query.as_object().and_then(|q| q.iter().next()) else {
        return true;
    };

    match kind.as_str() {
        "bool" => {
            let clauses = |name: &str| -> Vec<Value> {
                body.get(name)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default()
            };
            let must_ok = clauses("must").iter().all(|c| matches(doc, c));
            let must_not_ok = !clauses("must_not").iter().any(|c| matches(doc, c));
            let should = clauses("should");
            let required = body
                .get("minimum_should_match")
                .and_then(Value::as_u64)
                .unwrap_or(if should.is_empty() { 0 } else { 1 }) as usize;
            let should_ok = should.iter().filter(|c| matches(doc, c)).count() >= required;
            must_ok && must_not_ok && should_ok
        }
        "term" => body.as_object().map_or(false, |fields| {
            fields
                .iter()
                .all(|(field, value)| field_values(doc, field).contains(value))
        }),
        "terms" => body.as_object().map_or(false, |fields| {
            fields.iter().all(|(field, accepted)| {
                let accepted = accepted.as_array().cloned().unwrap_or_default();
                field_values(doc, field).iter().any(|v| accepted.contains(v))
            })
        }),
        "exists" => body
            .get("field")
            .and_then(Value::as_str)
            .map_or(false, |field| !field_values(doc, field).is_empty()),
        "range" => body.as_object().map_or(false, |fields| {
            fields.iter().all(|(field, bounds)| {
                field_values(doc, field).iter().any(|v| {
                    let gte = bounds
                        .get("gte")
                        .map_or(true, |b| matches!(compare(v, b), Some(Ordering::Greater | Ordering::Equal)));
                    let lte = bounds
                        .get("lte")
                        .map_or(true, |b| matches!(compare(v, b), Some(Ordering::Less | Ordering::Equal)));
                    gte && lte
                })
            })
        }),
        _ => false,
    }
}

/// Terms aggregations, ordered by count then key like the server
fn aggregate(docs: &[&StoredDoc], aggs: &Map<String, Value>) -> Value {
    let mut results = Map::new();

    for (name, agg) in aggs {
        let field = agg["terms"]["field"].as_str().unwrap_or_default();
        let size = agg["terms"]["size"].as_u64().unwrap_or(10) as usize;

        let mut groups: Vec<(Value, Vec<&StoredDoc>)> = Vec::new();
        for doc in docs {
            for value in field_values(doc, field) {
                match groups.iter_mut().find(|(key, _)| *key == value) {
                    Some((_, members)) => members.push(*doc),
                    None => groups.push((value, vec![*doc])),
                }
            }
        }
        groups.sort_by(|(ka, a), (kb, b)| {
            b.len()
                .cmp(&a.len())
                .then_with(|| compare(ka, kb).unwrap_or(Ordering::Equal))
        });

        let buckets: Vec<Value> = groups
            .into_iter()
            .take(size)
            .map(|(key, members)| {
                let mut bucket = Map::new();
                bucket.insert("key".to_string(), key);
                bucket.insert("doc_count".to_string(), json!(members.len()));
                if let Some(Value::Object(sub)) = agg.get("aggs") {
                    if let Value::Object(nested) = aggregate(&members, sub) {
                        bucket.extend(nested);
                    }
                }
                Value::Object(bucket)
            })
            .collect();

        results.insert(name.clone(), json!({ "buckets": buckets }));
    }

    Value::Object(results)
}

pub fn object_uuid(n: usize) -> String {
    format!("00000000-0000-4000-8000-{:012x}", n)
}

pub fn case_doc(uuid: &str, name: &str, status: &str, asset: &str) -> (String, Value) {
    (
        uuid.to_string(),
        json!({
            "class": "case",
            "fmu": {"case": {"name": name, "user": {"id": "peesv"}}},
            "_sumo": {"status": status},
            "access": {"asset": {"name": asset}},
            "masterdata": {"smda": {"field": [{"identifier": "DROGON"}]}},
        }),
    )
}

/// Realization surface in iteration `iter-{iteration}`
pub fn surface_doc(
    n: usize,
    case: &str,
    name: &str,
    iteration: i64,
    realization: i64,
) -> (String, Value) {
    (
        object_uuid(n),
        json!({
            "class": "surface",
            "_sumo": {"parent_object": case},
            "data": {
                "name": name,
                "tagname": "ds_extract_geogrid",
                "format": "irap_binary",
                "content": "depth",
            },
            "fmu": {
                "case": {"name": "drogon_ahm"},
                "iteration": {"id": iteration, "name": format!("iter-{}", iteration)},
                "realization": {"id": realization},
                "context": {"stage": "realization"},
            },
        }),
    )
}

/// Set `data.time` on a generated document
pub fn with_time(mut doc: (String, Value), t0: &str, t1: Option<&str>) -> (String, Value) {
    let mut time = json!({"t0": {"value": t0}});
    if let Some(t1) = t1 {
        time["t1"] = json!({"value": t1});
    }
    doc.1["data"]["time"] = time;
    doc
}

pub fn aggregated_surface_doc(n: usize, case: &str, name: &str, operation: &str) -> (String, Value) {
    (
        object_uuid(n),
        json!({
            "class": "surface",
            "_sumo": {"parent_object": case},
            "data": {"name": name, "tagname": "ds_extract_geogrid", "format": "irap_binary"},
            "fmu": {
                "iteration": {"id": 0, "name": "iter-0"},
                "aggregation": {"operation": operation},
                "context": {"stage": "iteration"},
            },
        }),
    )
}

pub fn paging(page_size: usize) -> PagingConfig {
    PagingConfig {
        case_page_size: page_size,
        child_page_size: page_size,
        ..PagingConfig::default()
    }
}

pub fn explorer(mock: &Arc<MockSearchClient>, page_size: usize) -> Explorer {
    Explorer::with_client(Arc::clone(mock) as Arc<dyn SearchClient>, paging(page_size))
}
