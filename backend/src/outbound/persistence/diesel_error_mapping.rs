//! Shared Diesel error mapping for the catalogue repositories.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;
use crate::domain::ports::CatalogueRepositoryError;

/// Map pool errors into connection failures.
pub(crate) fn map_pool_error(error: PoolError) -> CatalogueRepositoryError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    CatalogueRepositoryError::connection(message)
}

/// Map Diesel errors into catalogue store errors.
///
/// Constraint violations keep enough context for the service to answer with
/// a conflict or an invalid-reference error; anything else is reported
/// without database internals.
pub(crate) fn map_diesel_error(error: DieselError) -> CatalogueRepositoryError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            CatalogueRepositoryError::conflict(describe_unique_violation(info.constraint_name()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            CatalogueRepositoryError::invalid_reference(describe_missing_reference(
                info.constraint_name(),
            ))
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CatalogueRepositoryError::connection("database connection error")
        }
        DieselError::NotFound => CatalogueRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => {
            CatalogueRepositoryError::query("database query error")
        }
        _ => CatalogueRepositoryError::query("database error"),
    }
}

fn describe_unique_violation(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("films_name_key") => "a film with this name already exists",
        Some("characters_name_key") => "a character with this name already exists",
        Some("starships_name_model_key") => "a starship with this name and model already exists",
        Some(name) if name.ends_with("external_id_key") => {
            "a record with this external id already exists"
        }
        _ => "record already exists",
    }
}

fn describe_missing_reference(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.contains("film_id") => "referenced film does not exist",
        Some(name) if name.contains("character_id") => "referenced character does not exist",
        Some(name) if name.contains("starship_id") => "referenced starship does not exist",
        _ => "referenced record does not exist",
    }
}
