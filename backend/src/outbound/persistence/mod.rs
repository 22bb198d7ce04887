//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides the catalogue repository ports backed by PostgreSQL
//! via the Diesel ORM with async support through `diesel-async` and `bb8`
//! connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Uniqueness and reference rules are
//!   enforced by the schema and surfaced as typed errors.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Atomic writes**: Record rows and their relationship rows are written in
//!   one transaction.
//!
//! # Example
//!
//! ```ignore
//! use starwars_rest::outbound::persistence::{DbPool, DieselFilmRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/starwars")).await?;
//! let films = DieselFilmRepository::new(pool);
//! ```

mod diesel_character_repository;
mod diesel_error_mapping;
mod diesel_film_repository;
mod diesel_helpers;
mod diesel_starship_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_character_repository::DieselCharacterRepository;
pub use diesel_film_repository::DieselFilmRepository;
pub use diesel_starship_repository::DieselStarshipRepository;
pub use migrations::run_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
