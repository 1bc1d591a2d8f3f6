//! Lazy, paginated view over the documents of one object class
//!
//! Hits are fetched in fixed-size pages sorted descending on a stable key and
//! chained through `search_after`. The buffer only grows, the total count is
//! set once, and facet lookups are memoized per field for the lifetime of the
//! collection. Narrowing a collection always yields a fresh instance.

use crate::client::{post_json, SearchClient};
use crate::collection::ObjectClass;
use crate::error::{ExplorerError, Result};
use crate::metrics::record_page_fetch;
use crate::query::{Aggregation, SearchQuery, SearchRequest};
use crate::response::{RawHit, SearchResponse};
use futures::Stream;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

pub const SEARCH_PATH: &str = "/search";

/// Sort key giving every page a deterministic successor
pub const DEFAULT_SORT_FIELD: &str = "_doc";

/// Metadata returned for each hit in a page
pub const DEFAULT_SOURCE_FIELDS: &[&str] = &[
    "class",
    "data.name",
    "data.tagname",
    "data.time",
    "data.format",
    "data.bbox",
    "data.spec",
    "data.content",
    "fmu.case.name",
    "fmu.case.user.id",
    "fmu.iteration.id",
    "fmu.iteration.name",
    "fmu.realization.id",
    "fmu.context.stage",
    "fmu.aggregation.operation",
    "_sumo.status",
    "_sumo.parent_object",
    "access.asset",
    "masterdata.smda.field",
];

/// Distinct field value with its matching-document count
#[derive(Debug, Clone, PartialEq)]
pub struct FacetValue {
    pub value: Value,
    pub count: u64,
}

/// Pagination state guarded by the collection's page lock
#[derive(Debug, Default)]
struct PageState {
    cursor: Option<Vec<Value>>,
    hits: Vec<RawHit>,
    total: Option<usize>,
}

type FacetCell = Arc<OnceCell<Vec<FacetValue>>>;

/// Collection of documents of one class matching an immutable query
pub struct DocumentCollection {
    client: Arc<dyn SearchClient>,
    object_class: ObjectClass,
    query: SearchQuery,
    page_size: usize,
    facet_size: usize,
    sort_field: String,
    source_fields: Option<Vec<String>>,
    state: tokio::sync::Mutex<PageState>,
    facets: Mutex<HashMap<String, FacetCell>>,
}

impl std::fmt::Debug for DocumentCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCollection")
            .field("object_class", &self.object_class)
            .field("query", &self.query)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl DocumentCollection {
    /// Collection of every document of `object_class`, narrowed by `query`
    pub fn new(
        client: Arc<dyn SearchClient>,
        object_class: ObjectClass,
        query: Option<&SearchQuery>,
        page_size: usize,
        facet_size: usize,
    ) -> Self {
        let class_query = SearchQuery::term("class.keyword", object_class.as_str());
        let query = match query {
            Some(q) => class_query.extend(q),
            None => class_query,
        };

        Self {
            client,
            object_class,
            query,
            page_size: page_size.max(1),
            facet_size: facet_size.max(1),
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            source_fields: Some(DEFAULT_SOURCE_FIELDS.iter().map(|s| s.to_string()).collect()),
            state: tokio::sync::Mutex::new(PageState::default()),
            facets: Mutex::new(HashMap::new()),
        }
    }

    /// Sort pages on another descending key
    pub fn with_sort_field(mut self, field: &str) -> Self {
        self.sort_field = field.to_string();
        self
    }

    /// Restrict `_source` to these fields; `None` returns full documents
    pub fn with_source_fields(mut self, fields: Option<Vec<String>>) -> Self {
        self.source_fields = fields;
        self
    }

    pub fn client(&self) -> &Arc<dyn SearchClient> {
        &self.client
    }

    pub fn object_class(&self) -> ObjectClass {
        self.object_class
    }

    /// The fully composed query
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn facet_size(&self) -> usize {
        self.facet_size
    }

    /// New collection whose query is this one extended by `addition`.
    ///
    /// Buffers, cursor and caches start empty; nothing is shared with `self`.
    pub fn filtered(&self, addition: &SearchQuery) -> DocumentCollection {
        DocumentCollection {
            client: Arc::clone(&self.client),
            object_class: self.object_class,
            query: self.query.extend(addition),
            page_size: self.page_size,
            facet_size: self.facet_size,
            sort_field: self.sort_field.clone(),
            source_fields: self.source_fields.clone(),
            state: tokio::sync::Mutex::new(PageState::default()),
            facets: Mutex::new(HashMap::new()),
        }
    }

    /// Number of matching documents on the server
    pub async fn len(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        if let Some(total) = state.total {
            return Ok(total);
        }

        let request = SearchRequest::count(self.query.clone());
        let response: SearchResponse =
            post_json(self.client.as_ref(), SEARCH_PATH, &request.to_value()?).await?;
        let total = response.total().ok_or_else(|| {
            ExplorerError::MalformedResponse("count response without total hits".to_string())
        })?;

        debug!(class = %self.object_class, total, "Counted documents");
        state.total = Some(total);
        Ok(total)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Number of hits fetched so far
    pub async fn buffered(&self) -> usize {
        self.state.lock().await.hits.len()
    }

    /// Document at `index` in the server's sort order
    pub async fn at(&self, index: usize) -> Result<RawHit> {
        let mut state = self.state.lock().await;

        if state.total.is_none() && state.hits.is_empty() {
            self.next_page(&mut state).await?;
        }

        let len = state.total.unwrap_or(state.hits.len());
        if index >= len {
            return Err(ExplorerError::OutOfRange { index, len });
        }

        while state.hits.len() <= index {
            if self.next_page(&mut state).await? == 0 {
                return Err(ExplorerError::Integrity {
                    index,
                    buffered: state.hits.len(),
                });
            }
        }

        Ok(state.hits[index].clone())
    }

    /// All documents in order, fetched page by page as the stream is polled
    pub fn stream(&self) -> impl Stream<Item = Result<RawHit>> + '_ {
        futures::stream::try_unfold(0usize, move |index| async move {
            match self.at(index).await {
                Ok(hit) => Ok(Some((hit, index + 1))),
                Err(ExplorerError::OutOfRange { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    /// Fetch one page into the buffer, returning how many hits it held
    async fn next_page(&self, state: &mut PageState) -> Result<usize> {
        let mut request = SearchRequest::new(self.query.clone(), self.page_size)
            .sorted_desc(&self.sort_field);
        request.source = self.source_fields.clone();
        request.search_after = state.cursor.clone();
        let wants_total = state.total.is_none();
        if wants_total {
            request.track_total_hits = Some(true);
        }

        let response: SearchResponse =
            post_json(self.client.as_ref(), SEARCH_PATH, &request.to_value()?).await?;
        if wants_total {
            state.total = response.total();
        }

        let hits = response.hits.hits;
        record_page_fetch(self.object_class.as_str(), hits.len());
        debug!(
            class = %self.object_class,
            cursor = ?state.cursor,
            page_size = self.page_size,
            hits = hits.len(),
            "Fetched page"
        );

        if hits.is_empty() {
            if state.total.is_none() {
                warn!(
                    class = %self.object_class,
                    buffered = state.hits.len(),
                    "Empty page before total was known, using buffered length"
                );
                state.total = Some(state.hits.len());
            }
            return Ok(0);
        }

        if state.total.is_none() {
            return Err(ExplorerError::MalformedResponse(
                "search response without total hits".to_string(),
            ));
        }

        let cursor = hits
            .last()
            .and_then(|hit| hit.sort.clone())
            .ok_or_else(|| ExplorerError::MalformedResponse("hit without sort key".to_string()))?;
        state.cursor = Some(cursor);

        let fetched = hits.len();
        state.hits.extend(hits);
        Ok(fetched)
    }

    /// Distinct values of `field` among matching documents, in bucket order
    pub async fn facet_values(&self, field: &str) -> Result<Vec<Value>> {
        Ok(self
            .facets(field)
            .await?
            .into_iter()
            .map(|facet| facet.value)
            .collect())
    }

    /// Distinct values of `field` with their document counts
    pub async fn facets(&self, field: &str) -> Result<Vec<FacetValue>> {
        self.facets_where(field, field, None, self.facet_size).await
    }

    /// Memoized terms aggregation on `field` under `cache_key`, optionally
    /// narrowed by `restrict` and with a custom bucket size
    pub(crate) async fn facets_where(
        &self,
        cache_key: &str,
        field: &str,
        restrict: Option<&SearchQuery>,
        size: usize,
    ) -> Result<Vec<FacetValue>> {
        if field.is_empty() || field.contains(char::is_whitespace) {
            return Err(ExplorerError::Config(format!("Invalid field name: '{}'", field)));
        }

        let cell = {
            let mut facets = self.facets.lock();
            Arc::clone(facets.entry(cache_key.to_string()).or_default())
        };

        if cell.initialized() {
            debug!(class = %self.object_class, field, "Facet cache hit");
        }

        let values = cell
            .get_or_try_init(|| async {
                let query = match restrict {
                    Some(extra) => self.query.extend(extra),
                    None => self.query.clone(),
                };
                let request =
                    SearchRequest::aggregation(query, field, Aggregation::terms(field, size));
                let response: SearchResponse =
                    post_json(self.client.as_ref(), SEARCH_PATH, &request.to_value()?).await?;

                let values: Vec<FacetValue> = response
                    .buckets(field)?
                    .iter()
                    .map(|bucket| FacetValue {
                        value: bucket.display_key(),
                        count: bucket.doc_count,
                    })
                    .collect();
                debug!(class = %self.object_class, field, values = values.len(), "Fetched facet");
                Ok::<_, ExplorerError>(values)
            })
            .await?;

        Ok(values.clone())
    }

    /// Ids of every matching document, paged `batch_size` at a time.
    ///
    /// Uses its own cursor so the main buffer is left alone.
    pub async fn all_ids(&self, batch_size: usize) -> Result<Vec<String>> {
        let batch_size = batch_size.max(1);
        let mut ids = Vec::new();
        let mut cursor: Option<Vec<Value>> = None;
        let mut total: Option<usize> = None;

        loop {
            let mut request = SearchRequest::new(self.query.clone(), batch_size)
                .sorted_desc(&self.sort_field);
            request.source = Some(vec!["_id".to_string()]);
            request.search_after = cursor.take();
            if total.is_none() {
                request.track_total_hits = Some(true);
            }

            let response: SearchResponse =
                post_json(self.client.as_ref(), SEARCH_PATH, &request.to_value()?).await?;
            if total.is_none() {
                total = response.total();
            }

            let hits = response.hits.hits;
            if hits.is_empty() {
                break;
            }

            cursor = hits.last().and_then(|hit| hit.sort.clone());
            ids.extend(hits.into_iter().map(|hit| hit.id));

            match (total, &cursor) {
                (Some(total), _) if ids.len() >= total => break,
                (_, None) => {
                    return Err(ExplorerError::MalformedResponse(
                        "hit without sort key".to_string(),
                    ))
                }
                _ => {}
            }
        }

        debug!(class = %self.object_class, ids = ids.len(), "Listed object ids");
        Ok(ids)
    }
}
