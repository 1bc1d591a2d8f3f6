//! Collections of objects under one case

use crate::client::SearchClient;
use crate::collection::{DocumentCollection, FacetValue, ObjectClass};
use crate::config::PagingConfig;
use crate::error::Result;
use crate::objects::Child;
use crate::query::{build_terms, SearchQuery, TermFilter};
use crate::response::RawHit;
use crate::timefilter::TimeFilter;
use futures::{Stream, TryStreamExt};
use serde_json::Value;
use std::sync::Arc;

const PARENT_FIELD: &str = "_sumo.parent_object.keyword";
const NAME_FIELD: &str = "data.name.keyword";
const TAGNAME_FIELD: &str = "data.tagname.keyword";
const ITERATION_FIELD: &str = "fmu.iteration.name.keyword";
const ITERATION_ID_FIELD: &str = "fmu.iteration.id";
const REALIZATION_FIELD: &str = "fmu.realization.id";
const AGGREGATION_FIELD: &str = "fmu.aggregation.operation.keyword";
const STAGE_FIELD: &str = "fmu.context.stage.keyword";

/// Narrowing applied to a child collection.
///
/// Each dimension is either absent (no constraint), a set of accepted values,
/// or an existence requirement (`true`/`false`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildFilter {
    pub name: Option<TermFilter>,
    pub tagname: Option<TermFilter>,
    pub iteration: Option<TermFilter>,
    pub iteration_id: Option<TermFilter>,
    pub realization: Option<TermFilter>,
    pub aggregation: Option<TermFilter>,
    pub stage: Option<TermFilter>,
    pub time: Option<TimeFilter>,
}

impl ChildFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<TermFilter>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tagname(mut self, tagname: impl Into<TermFilter>) -> Self {
        self.tagname = Some(tagname.into());
        self
    }

    /// Iteration name, e.g. `iter-0`
    pub fn iteration(mut self, iteration: impl Into<TermFilter>) -> Self {
        self.iteration = Some(iteration.into());
        self
    }

    pub fn iteration_id(mut self, iteration_id: impl Into<TermFilter>) -> Self {
        self.iteration_id = Some(iteration_id.into());
        self
    }

    pub fn realization(mut self, realization: impl Into<TermFilter>) -> Self {
        self.realization = Some(realization.into());
        self
    }

    pub fn aggregation(mut self, aggregation: impl Into<TermFilter>) -> Self {
        self.aggregation = Some(aggregation.into());
        self
    }

    pub fn stage(mut self, stage: impl Into<TermFilter>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn time(mut self, time: TimeFilter) -> Self {
        self.time = Some(time);
        self
    }

    /// Query fragment for this filter
    pub fn to_query(&self) -> Result<SearchQuery> {
        let terms = build_terms(&[
            (NAME_FIELD, self.name.as_ref()),
            (TAGNAME_FIELD, self.tagname.as_ref()),
            (ITERATION_FIELD, self.iteration.as_ref()),
            (ITERATION_ID_FIELD, self.iteration_id.as_ref()),
            (REALIZATION_FIELD, self.realization.as_ref()),
            (AGGREGATION_FIELD, self.aggregation.as_ref()),
            (STAGE_FIELD, self.stage.as_ref()),
        ]);

        match &self.time {
            Some(time) => Ok(terms.extend(&time.to_query()?)),
            None => Ok(terms),
        }
    }
}

/// Documents of one child class scoped to a case
#[derive(Debug)]
pub struct ChildCollection {
    case_uuid: String,
    paging: PagingConfig,
    documents: DocumentCollection,
}

impl ChildCollection {
    pub fn new(
        client: Arc<dyn SearchClient>,
        object_class: ObjectClass,
        case_uuid: &str,
        paging: PagingConfig,
    ) -> Self {
        let case_scope = SearchQuery::term(PARENT_FIELD, case_uuid);
        Self {
            case_uuid: case_uuid.to_string(),
            paging,
            documents: DocumentCollection::new(
                client,
                object_class,
                Some(&case_scope),
                paging.child_page_size,
                paging.facet_size,
            ),
        }
    }

    pub fn case_uuid(&self) -> &str {
        &self.case_uuid
    }

    pub fn paging(&self) -> PagingConfig {
        self.paging
    }

    pub fn documents(&self) -> &DocumentCollection {
        &self.documents
    }

    pub fn query(&self) -> &SearchQuery {
        self.documents.query()
    }

    /// New collection narrowed by a raw query fragment
    pub fn filtered(&self, addition: &SearchQuery) -> ChildCollection {
        ChildCollection {
            case_uuid: self.case_uuid.clone(),
            paging: self.paging,
            documents: self.documents.filtered(addition),
        }
    }

    /// New collection narrowed by `filter`
    pub fn add_filter(&self, filter: &ChildFilter) -> Result<ChildCollection> {
        Ok(self.filtered(&filter.to_query()?))
    }

    pub async fn len(&self) -> Result<usize> {
        self.documents.len().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        self.documents.is_empty().await
    }

    pub async fn raw_at(&self, index: usize) -> Result<RawHit> {
        self.documents.at(index).await
    }

    /// Object at `index`; wrapping happens only for the requested hit
    pub async fn at(&self, index: usize) -> Result<Child> {
        let hit = self.documents.at(index).await?;
        Child::from_hit(Arc::clone(self.documents.client()), hit)
    }

    pub fn stream(&self) -> impl Stream<Item = Result<Child>> + '_ {
        let client = Arc::clone(self.documents.client());
        self.documents
            .stream()
            .and_then(move |hit| futures::future::ready(Child::from_hit(Arc::clone(&client), hit)))
    }

    pub async fn facets(&self, field: &str) -> Result<Vec<FacetValue>> {
        self.documents.facets(field).await
    }

    /// Unique object names
    pub async fn names(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(NAME_FIELD).await
    }

    /// Unique object tagnames
    pub async fn tagnames(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(TAGNAME_FIELD).await
    }

    /// Unique iteration names
    pub async fn iterations(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(ITERATION_FIELD).await
    }

    pub async fn iteration_ids(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(ITERATION_ID_FIELD).await
    }

    /// Unique realization ids
    pub async fn realizations(&self) -> Result<Vec<Value>> {
        let size = self.paging.realization_facet_size;
        Ok(self
            .documents
            .facets_where("realizations", REALIZATION_FIELD, None, size)
            .await?
            .into_iter()
            .map(|facet| facet.value)
            .collect())
    }

    /// Unique aggregation operations
    pub async fn aggregations(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(AGGREGATION_FIELD).await
    }

    pub async fn stages(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(STAGE_FIELD).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timefilter::TimeType;
    use serde_json::json;

    #[test]
    fn test_filter_to_query() {
        let query = ChildFilter::new()
            .name("DS_extract_geogrid")
            .realization(vec![0, 1])
            .aggregation(false)
            .to_query()
            .unwrap();

        assert_eq!(
            query.as_value(),
            &json!({"bool": {
                "must": [
                    {"terms": {"data.name.keyword": ["DS_extract_geogrid"]}},
                    {"terms": {"fmu.realization.id": [0, 1]}}
                ],
                "must_not": [{"exists": {"field": "fmu.aggregation.operation.keyword"}}]
            }})
        );
    }

    #[test]
    fn test_filter_merges_time() {
        let query = ChildFilter::new()
            .stage("realization")
            .time(TimeFilter::new(TimeType::None))
            .to_query()
            .unwrap();

        assert_eq!(
            query.clauses("must"),
            &[json!({"terms": {"fmu.context.stage.keyword": ["realization"]}})]
        );
        assert_eq!(
            query.clauses("must_not"),
            &[json!({"exists": {"field": "data.time"}})]
        );
    }

    #[test]
    fn test_empty_filter_is_neutral() {
        assert_eq!(ChildFilter::new().to_query().unwrap(), SearchQuery::empty());
    }
}
