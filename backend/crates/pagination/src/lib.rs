//! Page envelope and page request primitives shared by the backend.
//!
//! The same `{count, next, previous, results}` envelope is used when decoding
//! pages from the upstream Star Wars catalogue and when serving list endpoints,
//! so both sides of the backend agree on one shape.

mod envelope;
mod request;

pub use envelope::Page;
pub use request::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageLinks, PageRequest, PageRequestError};
