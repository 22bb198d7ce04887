//! Shared types for the film, character and starship store ports.
//!
//! Each entity type has its own repository trait so adapters can be swapped
//! per type, but all of them report failures through
//! [`CatalogueRepositoryError`] and return listings as [`RecordSlice`].

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalogue store adapters.
    pub enum CatalogueRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "catalogue store connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } =>
            "catalogue store query failed: {message}",
        /// A uniqueness rule was violated.
        Conflict { message: String } =>
            "catalogue store conflict: {message}",
        /// A relationship referenced a record that does not exist.
        InvalidReference { message: String } =>
            "catalogue store reference invalid: {message}",
    }
}

/// One window of an ordered listing plus the size of the whole listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSlice<T> {
    /// Records inside the requested window, ordered by store id.
    pub records: Vec<T>,
    /// Number of records matching the query across all windows.
    pub total: u64,
}

impl<T> RecordSlice<T> {
    /// An empty listing.
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
            total: 0,
        }
    }
}

impl<T> Default for RecordSlice<T> {
    fn default() -> Self {
        Self::empty()
    }
}
