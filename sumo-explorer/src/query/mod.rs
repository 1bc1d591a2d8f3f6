//! Search query composition
//!
//! Supported fragments:
//! - `bool` (must, must_not, should, minimum_should_match)
//! - `term` / `terms`
//! - `range`
//! - `exists`
//!
//! Supported aggregations:
//! - `terms` (optionally nested)

pub mod builder;
pub mod types;

pub use builder::{bool_query, build_terms, extend, TermFilter};
pub use types::{Aggregation, SearchQuery, SearchRequest, SortClause, SortOrder, TermsAgg};
