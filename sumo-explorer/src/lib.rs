//! Sumo Explorer - async read access to FMU results stored in Sumo
//!
//! Browse cases and the surfaces, polygons and tables stored under them
//! through lazily paginated, immutable collections.
//!
//! # Architecture
//!
//! - **Query**: structurally typed search fragments merged by deep-copy extension
//! - **TimeFilter**: time constraints translated into query fragments
//! - **Collections**: search-after pagination, memoized facets, typed filters
//! - **Objects**: cases and child objects wrapped on access, blobs fetched once
//! - **Aggregation**: per-operation cached server-side surface statistics
//! - **Transport**: [`SearchClient`] trait with a reqwest implementation
//!
//! # Example
//!
//! ```no_run
//! use sumo_explorer::{ChildFilter, Explorer, ExplorerConfig};
//!
//! # async fn run() -> sumo_explorer::Result<()> {
//! let explorer = Explorer::new(&ExplorerConfig::load()?)?;
//! let case = explorer.cases().at(0).await?;
//! let surfaces = case
//!     .surfaces()
//!     .filter(&ChildFilter::new().name("DS_extract_geogrid").iteration("iter-0"))?;
//! let mean = surfaces.mean().await?;
//! println!("{} bytes", mean.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod explorer;
pub mod metrics;
pub mod objects;
pub mod query;
pub mod response;
pub mod timefilter;

pub use client::{SearchClient, SumoClient};
pub use collection::{
    AggregationOperation, CaseCollection, CaseFilter, ChildCollection, ChildFilter,
    DocumentCollection, FacetValue, ObjectClass, PolygonsCollection, SurfaceCollection,
    TableCollection,
};
pub use config::{ExplorerConfig, LoggingConfig, PagingConfig};
pub use error::{ExplorerError, Result};
pub use explorer::Explorer;
pub use objects::{
    Case, Child, ChildKind, Document, IterationInfo, Polygons, Surface, SurfaceBlob, Table,
};
pub use query::{SearchQuery, TermFilter};
pub use response::RawHit;
pub use timefilter::{TimeFilter, TimeType};
