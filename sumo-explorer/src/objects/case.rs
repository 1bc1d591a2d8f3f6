//! Case objects

use crate::client::{post_json, SearchClient};
use crate::collection::{PolygonsCollection, SurfaceCollection, TableCollection, SEARCH_PATH};
use crate::config::PagingConfig;
use crate::error::{ExplorerError, Result};
use crate::objects::document::Document;
use crate::query::{Aggregation, SearchQuery, SearchRequest};
use crate::response::{RawHit, SearchResponse};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Iteration (ensemble) within a case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationInfo {
    pub id: i64,
    pub name: Option<String>,
    /// Number of distinct realizations with objects in this iteration
    pub realizations: usize,
}

/// A top-level FMU case
pub struct Case {
    client: Arc<dyn SearchClient>,
    document: Document,
    paging: PagingConfig,
    iterations: OnceCell<Vec<IterationInfo>>,
}

impl std::fmt::Debug for Case {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Case")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl Case {
    pub fn from_hit(client: Arc<dyn SearchClient>, hit: RawHit, paging: PagingConfig) -> Self {
        Self {
            client,
            document: Document::from(hit),
            paging,
            iterations: OnceCell::new(),
        }
    }

    pub fn uuid(&self) -> &str {
        self.document.id()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn name(&self) -> Option<&str> {
        self.document.get_str(&["fmu", "case", "name"])
    }

    pub fn status(&self) -> Option<&str> {
        self.document.get_str(&["_sumo", "status"])
    }

    /// User who uploaded the case
    pub fn user(&self) -> Option<&str> {
        self.document.get_str(&["fmu", "case", "user", "id"])
    }

    pub fn asset(&self) -> Option<&str> {
        self.document.get_str(&["access", "asset", "name"])
    }

    pub fn field(&self) -> Option<&str> {
        self.document
            .get_property(&["masterdata", "smda", "field"])
            .and_then(Value::as_array)
            .and_then(|fields| fields.first())
            .and_then(|field| field.get("identifier"))
            .and_then(Value::as_str)
    }

    /// Iterations of the case with their realization counts, fetched once
    pub async fn iterations(&self) -> Result<Vec<IterationInfo>> {
        let iterations = self
            .iterations
            .get_or_try_init(|| self.fetch_iterations())
            .await?;
        Ok(iterations.clone())
    }

    async fn fetch_iterations(&self) -> Result<Vec<IterationInfo>> {
        let aggregation = Aggregation::terms("fmu.iteration.id", self.paging.facet_size)
            .with_sub("name", Aggregation::terms("fmu.iteration.name.keyword", 1))
            .with_sub(
                "realizations",
                Aggregation::terms("fmu.realization.id", self.paging.realization_facet_size),
            );
        let request = SearchRequest::aggregation(
            SearchQuery::term("_sumo.parent_object.keyword", self.uuid()),
            "id",
            aggregation,
        );

        let response: SearchResponse =
            post_json(self.client.as_ref(), SEARCH_PATH, &request.to_value()?).await?;

        response
            .buckets("id")?
            .iter()
            .map(|bucket| -> Result<IterationInfo> {
                let id = bucket.key.as_i64().ok_or_else(|| {
                    ExplorerError::MalformedResponse(format!(
                        "iteration id is not an integer: {}",
                        bucket.key
                    ))
                })?;
                let name = bucket
                    .sub_buckets("name")?
                    .first()
                    .and_then(|b| b.key.as_str().map(str::to_string));
                let realizations = bucket.sub_buckets("realizations")?.len();
                Ok(IterationInfo {
                    id,
                    name,
                    realizations,
                })
            })
            .collect()
    }

    pub fn surfaces(&self) -> SurfaceCollection {
        SurfaceCollection::new(Arc::clone(&self.client), self.uuid(), self.paging)
    }

    pub fn polygons(&self) -> PolygonsCollection {
        PolygonsCollection::new(Arc::clone(&self.client), self.uuid(), self.paging)
    }

    pub fn tables(&self) -> TableCollection {
        TableCollection::new(Arc::clone(&self.client), self.uuid(), self.paging)
    }
}
