//! Aggregated runtime catalog.
//!
//! The catalog merges the description sets of all registered repositories
//! into one deduplicated view, and turns a chosen description into a
//! verified archive in the local inventory. Concurrent downloads of the
//! same identity are coalesced into a single transfer.

pub mod catalog;
pub mod error;

pub use catalog::{CancelSignal, Catalog, CatalogEntry, UpdateReport};
pub use error::CatalogError;
