//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every catalogue, sync and health endpoint of the inbound layer
//! - **Schemas**: request and response bodies plus the error envelope
//! - **Security**: bearer token scheme required by write endpoints
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::catalogue_sync::{StageReport, SyncReport, SyncStage, SyncState};
use crate::domain::ports::{SyncStatus, SyncTicket};
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::characters::{CharacterBody, CharacterPatchRequest, CharacterRequest};
use crate::inbound::http::films::{FilmBody, FilmPatchRequest, FilmRequest};
use crate::inbound::http::starships::{StarshipBody, StarshipPatchRequest, StarshipRequest};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("One of the configured API tokens."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Star Wars catalogue API",
        description = "Films, characters and starships mirrored from the public Star Wars catalogue.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::films::list_films,
        crate::inbound::http::films::search_films,
        crate::inbound::http::films::get_film,
        crate::inbound::http::films::create_film,
        crate::inbound::http::films::replace_film,
        crate::inbound::http::films::patch_film,
        crate::inbound::http::films::delete_film,
        crate::inbound::http::characters::list_characters,
        crate::inbound::http::characters::search_characters,
        crate::inbound::http::characters::get_character,
        crate::inbound::http::characters::create_character,
        crate::inbound::http::characters::replace_character,
        crate::inbound::http::characters::patch_character,
        crate::inbound::http::characters::delete_character,
        crate::inbound::http::starships::list_starships,
        crate::inbound::http::starships::search_starships,
        crate::inbound::http::starships::get_starship,
        crate::inbound::http::starships::create_starship,
        crate::inbound::http::starships::replace_starship,
        crate::inbound::http::starships::patch_starship,
        crate::inbound::http::starships::delete_starship,
        crate::inbound::http::sync::trigger_sync,
        crate::inbound::http::sync::sync_status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        FilmBody,
        FilmRequest,
        FilmPatchRequest,
        CharacterBody,
        CharacterRequest,
        CharacterPatchRequest,
        StarshipBody,
        StarshipRequest,
        StarshipPatchRequest,
        SyncTicket,
        SyncStatus,
        SyncReport,
        StageReport,
        SyncStage,
        SyncState,
    )),
    tags(
        (name = "films", description = "Films of the saga"),
        (name = "characters", description = "People appearing in the films"),
        (name = "starships", description = "Starships and their pilots"),
        (name = "sync", description = "Bulk population from the public catalogue"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema field structure.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case::error("Error", "traceId")]
    #[case::film("FilmBody", "releaseDate")]
    #[case::character("CharacterBody", "films")]
    #[case::starship("StarshipBody", "MGLT")]
    fn schemas_expose_wire_field_names(#[case] name: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get(name).expect("schema registered");

        assert_object_schema_has_field(schema, field);
    }

    #[rstest]
    fn every_collection_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/films",
            "/api/v1/films/{id}",
            "/api/v1/characters/search",
            "/api/v1/starships/{id}",
            "/api/v1/sync",
            "/health/ready",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerToken"));
    }
}
