//! Surfaces under a case, with server-side aggregation
//!
//! Aggregated surfaces are cached per operation for the lifetime of the
//! collection. The collection's query never changes, so neither does the set
//! of objects an aggregation covers, and cached blobs are never invalidated.
//! Each operation has its own async slot. Single and batched requests hold
//! the slots they fill for the whole round trip, and batched requests take
//! them in operation order, so an operation is never requested twice.

use crate::client::{post_json, SearchClient};
use crate::collection::child::{ChildCollection, ChildFilter};
use crate::collection::{ObjectClass, SEARCH_PATH};
use crate::config::PagingConfig;
use crate::error::{ExplorerError, Result};
use crate::metrics::record_aggregation;
use crate::objects::{Surface, SurfaceBlob};
use crate::query::{Aggregation, SearchRequest};
use crate::response::{Bucket, SearchResponse};
use crate::timefilter::{TimeFilter, TimeType};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub const AGGREGATE_PATH: &str = "/aggregate";

const T0_VALUE: &str = "data.time.t0.value";
const T1_VALUE: &str = "data.time.t1.value";

/// Statistical reduction computed across realizations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AggregationOperation {
    Mean,
    Min,
    Max,
    Std,
    P10,
    P50,
    P90,
}

impl AggregationOperation {
    pub const ALL: [AggregationOperation; 7] = [
        AggregationOperation::Mean,
        AggregationOperation::Min,
        AggregationOperation::Max,
        AggregationOperation::Std,
        AggregationOperation::P10,
        AggregationOperation::P50,
        AggregationOperation::P90,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationOperation::Mean => "mean",
            AggregationOperation::Min => "min",
            AggregationOperation::Max => "max",
            AggregationOperation::Std => "std",
            AggregationOperation::P10 => "p10",
            AggregationOperation::P50 => "p50",
            AggregationOperation::P90 => "p90",
        }
    }
}

impl fmt::Display for AggregationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationOperation {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        AggregationOperation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ExplorerError::Config(format!(
                    "Invalid aggregation operation: {}. Accepted: mean, min, max, std, p10, p50, p90",
                    s
                ))
            })
    }
}

type BlobSlot = Arc<tokio::sync::Mutex<Option<SurfaceBlob>>>;

/// Surfaces of one case
pub struct SurfaceCollection {
    children: ChildCollection,
    aggregations: Mutex<HashMap<AggregationOperation, BlobSlot>>,
    intervals: OnceCell<Vec<(String, String)>>,
}

impl fmt::Debug for SurfaceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceCollection")
            .field("children", &self.children)
            .field("aggregation_slots", &self.aggregations.lock().len())
            .finish_non_exhaustive()
    }
}

impl SurfaceCollection {
    pub fn new(client: Arc<dyn SearchClient>, case_uuid: &str, paging: PagingConfig) -> Self {
        Self::from_children(ChildCollection::new(
            client,
            ObjectClass::Surface,
            case_uuid,
            paging,
        ))
    }

    fn from_children(children: ChildCollection) -> Self {
        Self {
            children,
            aggregations: Mutex::new(HashMap::new()),
            intervals: OnceCell::new(),
        }
    }

    pub fn children(&self) -> &ChildCollection {
        &self.children
    }

    /// New collection narrowed by `filter`, with empty caches
    pub fn filter(&self, filter: &ChildFilter) -> Result<SurfaceCollection> {
        Ok(Self::from_children(self.children.add_filter(filter)?))
    }

    pub async fn at(&self, index: usize) -> Result<Surface> {
        Ok(Surface::new(self.children.at(index).await?))
    }

    pub fn stream(&self) -> impl Stream<Item = Result<Surface>> + '_ {
        self.children.stream().map_ok(Surface::new)
    }

    /// Distinct single-point timestamps (`data.time.t0` without `t1`)
    pub async fn timestamps(&self) -> Result<Vec<String>> {
        let restrict = TimeFilter::new(TimeType::Timestamp).to_query()?;
        let size = self.children.paging().interval_facet_size;
        Ok(self
            .children
            .documents()
            .facets_where("timestamps", T0_VALUE, Some(&restrict), size)
            .await?
            .into_iter()
            .map(|facet| value_text(&facet.value))
            .collect())
    }

    /// Distinct `(t0, t1)` intervals, fetched once
    pub async fn intervals(&self) -> Result<Vec<(String, String)>> {
        let intervals = self
            .intervals
            .get_or_try_init(|| self.fetch_intervals())
            .await?;
        Ok(intervals.clone())
    }

    async fn fetch_intervals(&self) -> Result<Vec<(String, String)>> {
        let size = self.children.paging().interval_facet_size;
        let query = self
            .children
            .query()
            .extend(&TimeFilter::new(TimeType::Interval).to_query()?);
        let aggregation =
            Aggregation::terms(T0_VALUE, size).with_sub("t1", Aggregation::terms(T1_VALUE, size));
        let request = SearchRequest::aggregation(query, "t0", aggregation);

        let documents = self.children.documents();
        let response: SearchResponse =
            post_json(documents.client().as_ref(), SEARCH_PATH, &request.to_value()?).await?;

        let mut intervals = Vec::new();
        for t0 in response.buckets("t0")? {
            let start = bucket_text(t0);
            for t1 in t0.sub_buckets("t1")? {
                intervals.push((start.clone(), bucket_text(&t1)));
            }
        }

        debug!(intervals = intervals.len(), "Fetched surface intervals");
        Ok(intervals)
    }

    fn blob_slot(&self, operation: AggregationOperation) -> BlobSlot {
        let mut aggregations = self.aggregations.lock();
        Arc::clone(aggregations.entry(operation).or_default())
    }

    /// Aggregate every surface in the collection with `operation`.
    ///
    /// The first call per operation does the remote work; later calls reuse
    /// the cached blob.
    pub async fn aggregate(&self, operation: AggregationOperation) -> Result<SurfaceBlob> {
        let slot = self.blob_slot(operation);
        let mut cached = slot.lock().await;
        if let Some(blob) = cached.as_ref() {
            debug!(operation = %operation, "Aggregation cache hit");
            return Ok(blob.clone());
        }

        let body = self.request_aggregation(&[operation]).await?;
        let blob = SurfaceBlob::from_bytes(body)?;
        *cached = Some(blob.clone());
        Ok(blob)
    }

    /// Aggregate parsing the operation name first
    pub async fn aggregate_named(&self, operation: &str) -> Result<SurfaceBlob> {
        let operation = operation.parse::<AggregationOperation>()?;
        self.aggregate(operation).await
    }

    /// Several aggregations in one request.
    ///
    /// Operations already cached are not requested again. The server answers
    /// a multi-operation request with a zip archive holding one entry per
    /// operation.
    pub async fn aggregate_many(
        &self,
        operations: &[AggregationOperation],
    ) -> Result<HashMap<AggregationOperation, SurfaceBlob>> {
        let mut wanted = operations.to_vec();
        wanted.sort();
        wanted.dedup();

        // Slots are always locked in operation order
        let mut slots = Vec::with_capacity(wanted.len());
        for operation in wanted {
            let guard = self.blob_slot(operation).lock_owned().await;
            slots.push((operation, guard));
        }

        let missing: Vec<AggregationOperation> = slots
            .iter()
            .filter(|(_, cached)| cached.is_none())
            .map(|(operation, _)| *operation)
            .collect();
        if missing.len() < slots.len() {
            debug!(
                cached = slots.len() - missing.len(),
                missing = missing.len(),
                "Aggregation cache hit"
            );
        }

        let mut fetched = self.fetch_blobs(&missing).await?;
        let mut results = HashMap::with_capacity(slots.len());
        for (operation, mut cached) in slots {
            if let Some(blob) = fetched.remove(&operation) {
                *cached = Some(blob);
            }
            if let Some(blob) = cached.as_ref() {
                results.insert(operation, blob.clone());
            }
        }

        Ok(results)
    }

    /// One remote request covering every operation in `operations`
    async fn fetch_blobs(
        &self,
        operations: &[AggregationOperation],
    ) -> Result<HashMap<AggregationOperation, SurfaceBlob>> {
        let mut blobs = HashMap::with_capacity(operations.len());
        match operations {
            [] => {}
            [operation] => {
                let body = self.request_aggregation(operations).await?;
                blobs.insert(*operation, SurfaceBlob::from_bytes(body)?);
            }
            _ => {
                let body = self.request_aggregation(operations).await?;
                let mut entries = read_archive(&body)?;
                for operation in operations {
                    let data = entries.remove(operation.as_str()).ok_or_else(|| {
                        ExplorerError::Decode(format!(
                            "aggregation archive has no entry for {}",
                            operation
                        ))
                    })?;
                    blobs.insert(*operation, SurfaceBlob::from_bytes(data)?);
                }
            }
        }
        Ok(blobs)
    }

    async fn request_aggregation(&self, operations: &[AggregationOperation]) -> Result<Bytes> {
        let documents = self.children.documents();
        let object_ids = documents
            .all_ids(self.children.paging().id_batch_size)
            .await?;
        if object_ids.is_empty() {
            return Err(ExplorerError::EmptyAggregation);
        }

        let names: Vec<&str> = operations.iter().map(AggregationOperation::as_str).collect();
        info!(
            operations = ?names,
            objects = object_ids.len(),
            case = self.children.case_uuid(),
            "Requesting aggregation"
        );
        for operation in operations {
            record_aggregation(operation.as_str(), object_ids.len());
        }

        let body = json!({
            "operation": names,
            "object_ids": object_ids,
        });
        documents.client().post(AGGREGATE_PATH, &body).await
    }

    pub async fn mean(&self) -> Result<SurfaceBlob> {
        self.aggregate(AggregationOperation::Mean).await
    }

    pub async fn min(&self) -> Result<SurfaceBlob> {
        self.aggregate(AggregationOperation::Min).await
    }

    pub async fn max(&self) -> Result<SurfaceBlob> {
        self.aggregate(AggregationOperation::Max).await
    }

    pub async fn std(&self) -> Result<SurfaceBlob> {
        self.aggregate(AggregationOperation::Std).await
    }

    pub async fn p10(&self) -> Result<SurfaceBlob> {
        self.aggregate(AggregationOperation::P10).await
    }

    pub async fn p50(&self) -> Result<SurfaceBlob> {
        self.aggregate(AggregationOperation::P50).await
    }

    pub async fn p90(&self) -> Result<SurfaceBlob> {
        self.aggregate(AggregationOperation::P90).await
    }
}

impl std::ops::Deref for SurfaceCollection {
    type Target = ChildCollection;

    fn deref(&self) -> &ChildCollection {
        &self.children
    }
}

/// Entries of a zip archive keyed by file name, with and without extension
fn read_archive(data: &[u8]) -> Result<HashMap<String, Bytes>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut entries = HashMap::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| ExplorerError::Decode(format!("reading {}: {}", name, e)))?;

        let content = Bytes::from(content);
        if let Some((stem, _)) = name.rsplit_once('.') {
            entries
                .entry(stem.to_string())
                .or_insert_with(|| content.clone());
        }
        entries.insert(name, content);
    }

    Ok(entries)
}

fn bucket_text(bucket: &Bucket) -> String {
    value_text(&bucket.display_key())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::irap_header;
    use std::io::Write;

    #[test]
    fn test_operation_names() {
        assert_eq!("P90".parse::<AggregationOperation>().unwrap(), AggregationOperation::P90);
        assert_eq!(AggregationOperation::Std.to_string(), "std");
    }

    #[test]
    fn test_unknown_operation_is_config_error() {
        let err = "median".parse::<AggregationOperation>().unwrap_err();
        assert!(matches!(err, ExplorerError::Config(_)));
    }

    #[test]
    fn test_read_archive_keys_by_stem() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer.start_file("mean", options).unwrap();
            writer.write_all(&irap_header()).unwrap();
            writer.start_file("p10.gri", options).unwrap();
            writer.write_all(&irap_header()).unwrap();
            writer.finish().unwrap();
        }

        let entries = read_archive(buf.get_ref()).unwrap();
        assert_eq!(entries["mean"].len(), 36);
        assert!(entries.contains_key("p10"));
        assert!(entries.contains_key("p10.gri"));
    }

    #[test]
    fn test_read_archive_rejects_garbage() {
        let err = read_archive(b"not a zip").unwrap_err();
        assert!(matches!(err, ExplorerError::Decode(_)));
    }
}
