//! Collection of cases

use crate::client::SearchClient;
use crate::collection::{DocumentCollection, FacetValue, ObjectClass};
use crate::config::PagingConfig;
use crate::error::Result;
use crate::objects::Case;
use crate::query::{build_terms, SearchQuery, TermFilter};
use futures::{Stream, TryStreamExt};
use serde_json::Value;
use std::sync::Arc;

const UUID_FIELD: &str = "_id";
const NAME_FIELD: &str = "fmu.case.name.keyword";
const STATUS_FIELD: &str = "_sumo.status.keyword";
const USER_FIELD: &str = "fmu.case.user.id.keyword";
const ASSET_FIELD: &str = "access.asset.name.keyword";
const FIELD_FIELD: &str = "masterdata.smda.field.identifier.keyword";

/// Narrowing applied to a case collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseFilter {
    pub uuid: Option<TermFilter>,
    pub name: Option<TermFilter>,
    pub status: Option<TermFilter>,
    pub user: Option<TermFilter>,
    pub asset: Option<TermFilter>,
    pub field: Option<TermFilter>,
}

impl CaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uuid(mut self, uuid: impl Into<TermFilter>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn name(mut self, name: impl Into<TermFilter>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Case status, e.g. `keep` or `scratch`
    pub fn status(mut self, status: impl Into<TermFilter>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn user(mut self, user: impl Into<TermFilter>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn asset(mut self, asset: impl Into<TermFilter>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    /// SMDA field identifier
    pub fn field(mut self, field: impl Into<TermFilter>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn to_query(&self) -> SearchQuery {
        build_terms(&[
            (UUID_FIELD, self.uuid.as_ref()),
            (NAME_FIELD, self.name.as_ref()),
            (STATUS_FIELD, self.status.as_ref()),
            (USER_FIELD, self.user.as_ref()),
            (ASSET_FIELD, self.asset.as_ref()),
            (FIELD_FIELD, self.field.as_ref()),
        ])
    }
}

/// Cases visible to the caller
#[derive(Debug)]
pub struct CaseCollection {
    paging: PagingConfig,
    documents: DocumentCollection,
}

impl CaseCollection {
    pub fn new(client: Arc<dyn SearchClient>, paging: PagingConfig) -> Self {
        Self {
            paging,
            documents: DocumentCollection::new(
                client,
                ObjectClass::Case,
                None,
                paging.case_page_size,
                paging.facet_size,
            ),
        }
    }

    pub fn documents(&self) -> &DocumentCollection {
        &self.documents
    }

    pub fn query(&self) -> &SearchQuery {
        self.documents.query()
    }

    pub fn filtered(&self, addition: &SearchQuery) -> CaseCollection {
        CaseCollection {
            paging: self.paging,
            documents: self.documents.filtered(addition),
        }
    }

    /// New collection narrowed by `filter`
    pub fn filter(&self, filter: &CaseFilter) -> CaseCollection {
        self.filtered(&filter.to_query())
    }

    pub async fn len(&self) -> Result<usize> {
        self.documents.len().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        self.documents.is_empty().await
    }

    pub async fn at(&self, index: usize) -> Result<Case> {
        let hit = self.documents.at(index).await?;
        Ok(Case::from_hit(
            Arc::clone(self.documents.client()),
            hit,
            self.paging,
        ))
    }

    pub fn stream(&self) -> impl Stream<Item = Result<Case>> + '_ {
        let client = Arc::clone(self.documents.client());
        let paging = self.paging;
        self.documents
            .stream()
            .map_ok(move |hit| Case::from_hit(Arc::clone(&client), hit, paging))
    }

    pub async fn facets(&self, field: &str) -> Result<Vec<FacetValue>> {
        self.documents.facets(field).await
    }

    pub async fn names(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(NAME_FIELD).await
    }

    pub async fn statuses(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(STATUS_FIELD).await
    }

    pub async fn users(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(USER_FIELD).await
    }

    pub async fn assets(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(ASSET_FIELD).await
    }

    pub async fn fields(&self) -> Result<Vec<Value>> {
        self.documents.facet_values(FIELD_FIELD).await
    }
}
