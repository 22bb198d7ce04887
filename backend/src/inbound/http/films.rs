//! Film HTTP handlers.
//!
//! ```text
//! GET    /api/v1/films
//! GET    /api/v1/films/search?name=
//! GET    /api/v1/films/{id}
//! POST   /api/v1/films
//! PUT    /api/v1/films/{id}
//! PATCH  /api/v1/films/{id}
//! DELETE /api/v1/films/{id}
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use chrono::{DateTime, NaiveDate, Utc};
use pagination::Page;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, Film, FilmId, FilmPatch, NewFilm};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::WriteAccess;
use crate::inbound::http::paging::{PageBody, PageParams, SearchParams, envelope};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, nullable, parse_date, parse_external_id, parse_optional_date, require_field,
};

/// Film as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilmBody {
    pub id: i64,
    /// Catalogue identity; 0 for locally authored films.
    pub external_id: i64,
    pub name: String,
    pub episode_id: Option<i32>,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl From<Film> for FilmBody {
    fn from(film: Film) -> Self {
        Self {
            id: film.id.get(),
            external_id: film.external_id.get(),
            name: film.name,
            episode_id: film.episode_id,
            opening_crawl: film.opening_crawl,
            director: film.director,
            producer: film.producer,
            release_date: film.release_date,
            created_at: film.created_at,
            edited_at: film.edited_at,
        }
    }
}

/// Payload for creating or fully replacing a film.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilmRequest {
    /// Catalogue identity; omit or send 0 for a locally authored film.
    #[serde(default)]
    pub external_id: i64,
    pub name: Option<String>,
    pub episode_id: Option<i32>,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    #[schema(format = Date, example = "1977-05-25")]
    pub release_date: Option<String>,
}

impl FilmRequest {
    fn into_new_film(self) -> Result<NewFilm, Error> {
        Ok(NewFilm {
            external_id: parse_external_id(self.external_id, FieldName::new("externalId"))?,
            name: require_field(self.name, FieldName::new("name"))?,
            episode_id: self.episode_id,
            opening_crawl: self.opening_crawl,
            director: self.director,
            producer: self.producer,
            release_date: parse_optional_date(self.release_date, FieldName::new("releaseDate"))?,
        })
    }
}

/// Partial film update; absent fields are left unchanged, `null` clears.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilmPatchRequest {
    pub external_id: Option<i64>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub episode_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub opening_crawl: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub director: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub producer: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub release_date: Option<Option<String>>,
}

impl FilmPatchRequest {
    fn into_patch(self) -> Result<FilmPatch, Error> {
        let release_date = FieldName::new("releaseDate");
        Ok(FilmPatch {
            external_id: self
                .external_id
                .map(|id| parse_external_id(id, FieldName::new("externalId")))
                .transpose()?,
            name: self.name,
            episode_id: self.episode_id,
            opening_crawl: self.opening_crawl,
            director: self.director,
            producer: self.producer,
            release_date: self
                .release_date
                .map(|value| value.map(|raw| parse_date(&raw, release_date)).transpose())
                .transpose()?,
        })
    }
}

/// List films ordered by id.
#[utoipa::path(
    get,
    path = "/api/v1/films",
    params(PageParams),
    responses(
        (status = 200, description = "Page of films", body = PageBody<FilmBody>),
        (status = 400, description = "Invalid page parameters", body = Error)
    ),
    tags = ["films"],
    operation_id = "listFilms",
    security([])
)]
#[get("/films")]
pub async fn list_films(
    state: web::Data<HttpState>,
    req: HttpRequest,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<FilmBody>>> {
    let request = params.into_inner().to_request()?;
    let slice = state.query.list_films(request).await?;
    Ok(web::Json(envelope(&req, &request, slice, FilmBody::from)?))
}

/// Search films by case-insensitive name substring.
#[utoipa::path(
    get,
    path = "/api/v1/films/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Page of matching films", body = PageBody<FilmBody>),
        (status = 400, description = "Missing or blank name", body = Error)
    ),
    tags = ["films"],
    operation_id = "searchFilms",
    security([])
)]
#[get("/films/search")]
pub async fn search_films(
    state: web::Data<HttpState>,
    req: HttpRequest,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<Page<FilmBody>>> {
    let params = params.into_inner();
    let request = params.page_params().to_request()?;
    let name = params.name.unwrap_or_default();
    let slice = state.query.search_films(&name, request).await?;
    Ok(web::Json(envelope(&req, &request, slice, FilmBody::from)?))
}

/// Fetch one film.
#[utoipa::path(
    get,
    path = "/api/v1/films/{id}",
    params(("id" = i64, Path, description = "Film id")),
    responses(
        (status = 200, description = "Film", body = FilmBody),
        (status = 404, description = "Unknown film", body = Error)
    ),
    tags = ["films"],
    operation_id = "getFilm",
    security([])
)]
#[get("/films/{id}")]
pub async fn get_film(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
) -> ApiResult<web::Json<FilmBody>> {
    let film = state.query.get_film(FilmId::new(id.into_inner())).await?;
    Ok(web::Json(film.into()))
}

/// Create a film after checking it against the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/films",
    request_body = FilmRequest,
    responses(
        (status = 201, description = "Film created", body = FilmBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Writes disabled", body = Error),
        (status = 409, description = "Name already taken", body = Error),
        (status = 503, description = "Catalogue unreachable", body = Error)
    ),
    tags = ["films"],
    operation_id = "createFilm",
    security(("BearerToken" = []))
)]
#[post("/films")]
pub async fn create_film(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    payload: web::Json<FilmRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner().into_new_film()?;
    let film = state.command.create_film(draft).await?;
    Ok(HttpResponse::Created().json(FilmBody::from(film)))
}

/// Overwrite every writable attribute of a film.
#[utoipa::path(
    put,
    path = "/api/v1/films/{id}",
    params(("id" = i64, Path, description = "Film id")),
    request_body = FilmRequest,
    responses(
        (status = 200, description = "Film replaced", body = FilmBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown film", body = Error),
        (status = 409, description = "Name already taken", body = Error)
    ),
    tags = ["films"],
    operation_id = "replaceFilm",
    security(("BearerToken" = []))
)]
#[put("/films/{id}")]
pub async fn replace_film(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
    payload: web::Json<FilmRequest>,
) -> ApiResult<web::Json<FilmBody>> {
    let draft = payload.into_inner().into_new_film()?;
    let film = state
        .command
        .replace_film(FilmId::new(id.into_inner()), draft)
        .await?;
    Ok(web::Json(film.into()))
}

/// Change only the supplied attributes of a film.
#[utoipa::path(
    patch,
    path = "/api/v1/films/{id}",
    params(("id" = i64, Path, description = "Film id")),
    request_body = FilmPatchRequest,
    responses(
        (status = 200, description = "Film updated", body = FilmBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown film", body = Error),
        (status = 409, description = "Name already taken", body = Error)
    ),
    tags = ["films"],
    operation_id = "patchFilm",
    security(("BearerToken" = []))
)]
#[patch("/films/{id}")]
pub async fn patch_film(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
    payload: web::Json<FilmPatchRequest>,
) -> ApiResult<web::Json<FilmBody>> {
    let patch = payload.into_inner().into_patch()?;
    let film = state
        .command
        .patch_film(FilmId::new(id.into_inner()), patch)
        .await?;
    Ok(web::Json(film.into()))
}

/// Delete a film together with its relationship rows.
#[utoipa::path(
    delete,
    path = "/api/v1/films/{id}",
    params(("id" = i64, Path, description = "Film id")),
    responses(
        (status = 204, description = "Film deleted"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown film", body = Error)
    ),
    tags = ["films"],
    operation_id = "deleteFilm",
    security(("BearerToken" = []))
)]
#[delete("/films/{id}")]
pub async fn delete_film(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.command.delete_film(FilmId::new(id.into_inner())).await?;
    Ok(HttpResponse::NoContent().finish())
}
