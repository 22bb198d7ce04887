//! Domain primitives, ports and services.
//!
//! Purpose: Define the catalogue entities, the ports adapters implement and
//! the use-cases inbound adapters drive. Nothing here performs I/O directly.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - Film, Character, Starship and their creation and patch shapes.
//! - ExternalId — catalogue identity of a record, zero for local records.
//! - TraceId — request correlation identifier.

pub mod access;
pub mod catalogue_client;
pub mod catalogue_service;
pub mod catalogue_sync;
pub mod entities;
pub mod error;
pub mod external_id;
pub mod ports;
pub mod trace_id;

pub use self::access::AccessPolicy;
pub use self::entities::{
    Character, CharacterId, CharacterPatch, Film, FilmId, FilmPatch, MAX_NAME_LENGTH,
    NewCharacter, NewFilm, NewStarship, Starship, StarshipId, StarshipPatch,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::external_id::{ExternalId, ExternalIdError, external_id_from_url};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use starwars_rest::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
