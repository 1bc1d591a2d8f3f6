//! Domain objects wrapping fetched metadata documents

mod case;
mod child;
mod document;
mod polygons;
mod surface;
mod table;

pub use case::{Case, IterationInfo};
pub use child::{Child, ChildKind};
pub use document::Document;
pub use polygons::Polygons;
pub use surface::{Surface, SurfaceBlob};
pub use table::Table;

#[cfg(test)]
pub(crate) use surface::irap_header;
