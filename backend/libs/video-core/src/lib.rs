//! Video catalog core models and types
//!
//! Shared data structures for video-service: the video record, its owner
//! projection, and the search/sort/paginate vocabulary of the catalog.

pub mod catalog;
pub mod constants;
pub mod models;

pub use catalog::{CatalogFilter, CatalogSort, Page, PageRequest, SortDirection, SortField};
pub use models::*;
