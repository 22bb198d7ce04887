//! Character HTTP handlers.
//!
//! Same route shape as films; payloads may carry `films`, a list of local
//! film ids the character appears in.

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Character, CharacterId, CharacterPatch, Error, FilmId, NewCharacter};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::WriteAccess;
use crate::inbound::http::paging::{PageBody, PageParams, SearchParams, envelope};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, nullable, parse_external_id, require_field,
};

/// Character as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CharacterBody {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    /// Height in centimetres.
    pub height: Option<i32>,
    pub mass: Option<String>,
    pub skin_color: Option<String>,
    pub homeworld: Option<String>,
    /// Ids of the films the character appears in.
    pub films: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl From<Character> for CharacterBody {
    fn from(character: Character) -> Self {
        Self {
            id: character.id.get(),
            external_id: character.external_id.get(),
            name: character.name,
            birth_year: character.birth_year,
            eye_color: character.eye_color,
            gender: character.gender,
            hair_color: character.hair_color,
            height: character.height,
            mass: character.mass,
            skin_color: character.skin_color,
            homeworld: character.homeworld,
            films: character.films.into_iter().map(FilmId::get).collect(),
            created_at: character.created_at,
            edited_at: character.edited_at,
        }
    }
}

/// Payload for creating or fully replacing a character.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRequest {
    #[serde(default)]
    pub external_id: i64,
    pub name: Option<String>,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<i32>,
    pub mass: Option<String>,
    pub skin_color: Option<String>,
    pub homeworld: Option<String>,
    #[serde(default)]
    pub films: Vec<i64>,
}

impl CharacterRequest {
    fn into_parts(self) -> Result<(NewCharacter, Vec<FilmId>), Error> {
        let character = NewCharacter {
            external_id: parse_external_id(self.external_id, FieldName::new("externalId"))?,
            name: require_field(self.name, FieldName::new("name"))?,
            birth_year: self.birth_year,
            eye_color: self.eye_color,
            gender: self.gender,
            hair_color: self.hair_color,
            height: self.height,
            mass: self.mass,
            skin_color: self.skin_color,
            homeworld: self.homeworld,
        };
        Ok((character, film_ids(self.films)))
    }
}

/// Partial character update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPatchRequest {
    pub external_id: Option<i64>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub birth_year: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub eye_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub hair_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub height: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub mass: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub skin_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub homeworld: Option<Option<String>>,
    /// Replacement film set.
    pub films: Option<Vec<i64>>,
}

impl CharacterPatchRequest {
    fn into_patch(self) -> Result<CharacterPatch, Error> {
        Ok(CharacterPatch {
            external_id: self
                .external_id
                .map(|id| parse_external_id(id, FieldName::new("externalId")))
                .transpose()?,
            name: self.name,
            birth_year: self.birth_year,
            eye_color: self.eye_color,
            gender: self.gender,
            hair_color: self.hair_color,
            height: self.height,
            mass: self.mass,
            skin_color: self.skin_color,
            homeworld: self.homeworld,
            films: self.films.map(film_ids),
        })
    }
}

pub(crate) fn film_ids(ids: Vec<i64>) -> Vec<FilmId> {
    ids.into_iter().map(FilmId::new).collect()
}

/// List characters ordered by id.
#[utoipa::path(
    get,
    path = "/api/v1/characters",
    params(PageParams),
    responses(
        (status = 200, description = "Page of characters", body = PageBody<CharacterBody>),
        (status = 400, description = "Invalid page parameters", body = Error)
    ),
    tags = ["characters"],
    operation_id = "listCharacters",
    security([])
)]
#[get("/characters")]
pub async fn list_characters(
    state: web::Data<HttpState>,
    req: HttpRequest,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<CharacterBody>>> {
    let request = params.into_inner().to_request()?;
    let slice = state.query.list_characters(request).await?;
    Ok(web::Json(envelope(&req, &request, slice, CharacterBody::from)?))
}

/// Search characters by case-insensitive name substring.
#[utoipa::path(
    get,
    path = "/api/v1/characters/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Page of matching characters", body = PageBody<CharacterBody>),
        (status = 400, description = "Missing or blank name", body = Error)
    ),
    tags = ["characters"],
    operation_id = "searchCharacters",
    security([])
)]
#[get("/characters/search")]
pub async fn search_characters(
    state: web::Data<HttpState>,
    req: HttpRequest,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<Page<CharacterBody>>> {
    let params = params.into_inner();
    let request = params.page_params().to_request()?;
    let name = params.name.unwrap_or_default();
    let slice = state.query.search_characters(&name, request).await?;
    Ok(web::Json(envelope(&req, &request, slice, CharacterBody::from)?))
}

#[utoipa::path(
    get,
    path = "/api/v1/characters/{id}",
    params(("id" = i64, Path, description = "Character id")),
    responses(
        (status = 200, description = "Character", body = CharacterBody),
        (status = 404, description = "Unknown character", body = Error)
    ),
    tags = ["characters"],
    operation_id = "getCharacter",
    security([])
)]
#[get("/characters/{id}")]
pub async fn get_character(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
) -> ApiResult<web::Json<CharacterBody>> {
    let character = state
        .query
        .get_character(CharacterId::new(id.into_inner()))
        .await?;
    Ok(web::Json(character.into()))
}

/// Create a character after checking it against the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/characters",
    request_body = CharacterRequest,
    responses(
        (status = 201, description = "Character created", body = CharacterBody),
        (status = 400, description = "Invalid request or unknown film id", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Writes disabled", body = Error),
        (status = 409, description = "Name already taken", body = Error),
        (status = 503, description = "Catalogue unreachable", body = Error)
    ),
    tags = ["characters"],
    operation_id = "createCharacter",
    security(("BearerToken" = []))
)]
#[post("/characters")]
pub async fn create_character(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    payload: web::Json<CharacterRequest>,
) -> ApiResult<HttpResponse> {
    let (draft, films) = payload.into_inner().into_parts()?;
    let character = state.command.create_character(draft, films).await?;
    Ok(HttpResponse::Created().json(CharacterBody::from(character)))
}

#[utoipa::path(
    put,
    path = "/api/v1/characters/{id}",
    params(("id" = i64, Path, description = "Character id")),
    request_body = CharacterRequest,
    responses(
        (status = 200, description = "Character replaced", body = CharacterBody),
        (status = 400, description = "Invalid request or unknown film id", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown character", body = Error),
        (status = 409, description = "Name already taken", body = Error)
    ),
    tags = ["characters"],
    operation_id = "replaceCharacter",
    security(("BearerToken" = []))
)]
#[put("/characters/{id}")]
pub async fn replace_character(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
    payload: web::Json<CharacterRequest>,
) -> ApiResult<web::Json<CharacterBody>> {
    let (draft, films) = payload.into_inner().into_parts()?;
    let character = state
        .command
        .replace_character(CharacterId::new(id.into_inner()), draft, films)
        .await?;
    Ok(web::Json(character.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/characters/{id}",
    params(("id" = i64, Path, description = "Character id")),
    request_body = CharacterPatchRequest,
    responses(
        (status = 200, description = "Character updated", body = CharacterBody),
        (status = 400, description = "Invalid request or unknown film id", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown character", body = Error),
        (status = 409, description = "Name already taken", body = Error)
    ),
    tags = ["characters"],
    operation_id = "patchCharacter",
    security(("BearerToken" = []))
)]
#[patch("/characters/{id}")]
pub async fn patch_character(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
    payload: web::Json<CharacterPatchRequest>,
) -> ApiResult<web::Json<CharacterBody>> {
    let patch = payload.into_inner().into_patch()?;
    let character = state
        .command
        .patch_character(CharacterId::new(id.into_inner()), patch)
        .await?;
    Ok(web::Json(character.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/characters/{id}",
    params(("id" = i64, Path, description = "Character id")),
    responses(
        (status = 204, description = "Character deleted"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown character", body = Error)
    ),
    tags = ["characters"],
    operation_id = "deleteCharacter",
    security(("BearerToken" = []))
)]
#[delete("/characters/{id}")]
pub async fn delete_character(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state
        .command
        .delete_character(CharacterId::new(id.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
