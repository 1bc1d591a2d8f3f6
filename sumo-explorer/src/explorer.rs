//! Entry point for browsing Sumo

use crate::client::{SearchClient, SumoClient};
use crate::collection::{CaseCollection, DocumentCollection, ObjectClass};
use crate::config::{ExplorerConfig, PagingConfig};
use crate::error::{ExplorerError, Result};
use crate::objects::{Case, Child, Polygons, Surface, Table};
use crate::query::SearchQuery;
use crate::response::RawHit;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Read access to cases and their objects
#[derive(Clone)]
pub struct Explorer {
    client: Arc<dyn SearchClient>,
    paging: PagingConfig,
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("paging", &self.paging)
            .finish_non_exhaustive()
    }
}

impl Explorer {
    /// Explorer talking HTTP to the configured environment
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        let client = SumoClient::new(config)?;
        debug!(base_url = client.base_url(), "Created Sumo client");
        Ok(Self::with_client(Arc::new(client), config.paging))
    }

    /// Explorer over any search backend
    pub fn with_client(client: Arc<dyn SearchClient>, paging: PagingConfig) -> Self {
        Self { client, paging }
    }

    pub fn client(&self) -> &Arc<dyn SearchClient> {
        &self.client
    }

    pub fn paging(&self) -> PagingConfig {
        self.paging
    }

    /// Every case visible to the caller
    pub fn cases(&self) -> CaseCollection {
        CaseCollection::new(Arc::clone(&self.client), self.paging)
    }

    pub async fn get_case_by_uuid(&self, uuid: &str) -> Result<Case> {
        let hit = self.get_by_uuid(ObjectClass::Case, uuid).await?;
        Ok(Case::from_hit(Arc::clone(&self.client), hit, self.paging))
    }

    pub async fn get_surface_by_uuid(&self, uuid: &str) -> Result<Surface> {
        Ok(Surface::new(self.get_child(ObjectClass::Surface, uuid).await?))
    }

    pub async fn get_polygons_by_uuid(&self, uuid: &str) -> Result<Polygons> {
        Ok(Polygons::new(self.get_child(ObjectClass::Polygons, uuid).await?))
    }

    pub async fn get_table_by_uuid(&self, uuid: &str) -> Result<Table> {
        Ok(Table::new(self.get_child(ObjectClass::Table, uuid).await?))
    }

    async fn get_child(&self, object_class: ObjectClass, uuid: &str) -> Result<Child> {
        let hit = self.get_by_uuid(object_class, uuid).await?;
        Child::from_hit(Arc::clone(&self.client), hit)
    }

    async fn get_by_uuid(&self, object_class: ObjectClass, uuid: &str) -> Result<RawHit> {
        let uuid = Uuid::parse_str(uuid)
            .map_err(|e| ExplorerError::Config(format!("Invalid uuid {}: {}", uuid, e)))?
            .to_string();

        let lookup = DocumentCollection::new(
            Arc::clone(&self.client),
            object_class,
            Some(&SearchQuery::term("_id", uuid.as_str())),
            1,
            1,
        );

        match lookup.at(0).await {
            Ok(hit) => Ok(hit),
            Err(e) if e.is_out_of_range() => Err(ExplorerError::NotFound(format!(
                "{} {}",
                object_class, uuid
            ))),
            Err(e) => Err(e),
        }
    }
}
