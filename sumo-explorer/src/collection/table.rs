//! Table objects under a case

use crate::client::SearchClient;
use crate::collection::child::{ChildCollection, ChildFilter};
use crate::collection::ObjectClass;
use crate::config::PagingConfig;
use crate::error::Result;
use crate::objects::Table;
use futures::{Stream, TryStreamExt};
use std::sync::Arc;

#[derive(Debug)]
pub struct TableCollection {
    children: ChildCollection,
}

impl TableCollection {
    pub fn new(client: Arc<dyn SearchClient>, case_uuid: &str, paging: PagingConfig) -> Self {
        Self {
            children: ChildCollection::new(client, ObjectClass::Table, case_uuid, paging),
        }
    }

    pub fn children(&self) -> &ChildCollection {
        &self.children
    }

    pub fn filter(&self, filter: &ChildFilter) -> Result<TableCollection> {
        Ok(Self {
            children: self.children.add_filter(filter)?,
        })
    }

    pub async fn at(&self, index: usize) -> Result<Table> {
        Ok(Table::new(self.children.at(index).await?))
    }

    pub fn stream(&self) -> impl Stream<Item = Result<Table>> + '_ {
        self.children.stream().map_ok(Table::new)
    }
}

impl std::ops::Deref for TableCollection {
    type Target = ChildCollection;

    fn deref(&self) -> &ChildCollection {
        &self.children
    }
}
