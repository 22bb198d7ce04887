//! Star Wars catalogue backend.
//!
//! Hexagonal layout: [`domain`] holds entities, ports and use-cases;
//! [`inbound`] adapts HTTP requests onto the driving ports; [`outbound`]
//! implements the driven ports against PostgreSQL, Redis and the public
//! catalogue API.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
