//! Collections of Sumo documents
//!
//! [`DocumentCollection`] does the paging and memoization; the typed
//! collections bind it to one object class and wrap hits lazily.

mod case;
mod child;
mod document;
mod polygons;
mod surface;
mod table;

pub use case::{CaseCollection, CaseFilter};
pub use child::{ChildCollection, ChildFilter};
pub use document::{
    DocumentCollection, FacetValue, DEFAULT_SORT_FIELD, DEFAULT_SOURCE_FIELDS, SEARCH_PATH,
};
pub use polygons::PolygonsCollection;
pub use surface::{AggregationOperation, SurfaceCollection, AGGREGATE_PATH};
pub use table::TableCollection;

use crate::error::ExplorerError;
use std::fmt;
use std::str::FromStr;

/// Document classes stored in Sumo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Case,
    Surface,
    Polygons,
    Table,
}

impl ObjectClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Case => "case",
            ObjectClass::Surface => "surface",
            ObjectClass::Polygons => "polygons",
            ObjectClass::Table => "table",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "case" => Ok(ObjectClass::Case),
            "surface" => Ok(ObjectClass::Surface),
            "polygons" => Ok(ObjectClass::Polygons),
            "table" => Ok(ObjectClass::Table),
            other => Err(ExplorerError::Config(format!(
                "Invalid object class: {}. Accepted: case, surface, polygons, table",
                other
            ))),
        }
    }
}
