//! Polygons objects under a case

use crate::client::SearchClient;
use crate::collection::child::{ChildCollection, ChildFilter};
use crate::collection::ObjectClass;
use crate::config::PagingConfig;
use crate::error::Result;
use crate::objects::Polygons;
use futures::{Stream, TryStreamExt};
use std::sync::Arc;

/// Polygons of one case (fault lines, field outlines)
#[derive(Debug)]
pub struct PolygonsCollection {
    children: ChildCollection,
}

impl PolygonsCollection {
    pub fn new(client: Arc<dyn SearchClient>, case_uuid: &str, paging: PagingConfig) -> Self {
        Self {
            children: ChildCollection::new(client, ObjectClass::Polygons, case_uuid, paging),
        }
    }

    pub fn children(&self) -> &ChildCollection {
        &self.children
    }

    pub fn filter(&self, filter: &ChildFilter) -> Result<PolygonsCollection> {
        Ok(Self {
            children: self.children.add_filter(filter)?,
        })
    }

    pub async fn at(&self, index: usize) -> Result<Polygons> {
        Ok(Polygons::new(self.children.at(index).await?))
    }

    pub fn stream(&self) -> impl Stream<Item = Result<Polygons>> + '_ {
        self.children.stream().map_ok(Polygons::new)
    }
}

impl std::ops::Deref for PolygonsCollection {
    type Target = ChildCollection;

    fn deref(&self) -> &ChildCollection {
        &self.children
    }
}
