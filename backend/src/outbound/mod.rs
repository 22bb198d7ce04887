//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL catalogue store using Diesel ORM
//! - **memory**: in-process catalogue store used without a database
//! - **cache**: Redis or in-process response cache
//! - **swapi**: HTTP client for the upstream Star Wars catalogue
//! - **metrics**: Prometheus-backed metrics exporters (feature-gated)
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod memory;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod persistence;
pub mod swapi;
