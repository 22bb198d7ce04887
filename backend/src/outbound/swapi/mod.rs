//! Star Wars API outbound adapters.
//!
//! This module provides the reqwest implementation of the `CatalogueSource`
//! port.

mod dto;
mod http_source;

pub use http_source::{DEFAULT_CATALOGUE_URL, SwapiHttpSource};
