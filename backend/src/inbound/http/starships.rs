//! Starship HTTP handlers.
//!
//! Payloads may carry `films` and `pilots` as lists of local film and
//! character ids. Name and model together identify a starship.

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use chrono::{DateTime, Utc};
use pagination::Page;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CharacterId, Error, FilmId, NewStarship, Starship, StarshipId, StarshipPatch,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::WriteAccess;
use crate::inbound::http::characters::film_ids;
use crate::inbound::http::paging::{PageBody, PageParams, SearchParams, envelope};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, nullable, parse_external_id, require_field,
};

/// Starship as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StarshipBody {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub model: String,
    pub starship_class: Option<String>,
    pub manufacturer: Option<String>,
    pub cost_in_credits: Option<String>,
    pub length: Option<String>,
    pub crew: Option<String>,
    pub passengers: Option<String>,
    pub max_atmosphering_speed: Option<String>,
    pub hyperdrive_rating: Option<String>,
    #[serde(rename = "MGLT")]
    pub mglt: Option<String>,
    pub cargo_capacity: Option<String>,
    pub consumables: Option<String>,
    pub films: Vec<i64>,
    /// Ids of the characters who piloted the starship.
    pub pilots: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl From<Starship> for StarshipBody {
    fn from(starship: Starship) -> Self {
        Self {
            id: starship.id.get(),
            external_id: starship.external_id.get(),
            name: starship.name,
            model: starship.model,
            starship_class: starship.starship_class,
            manufacturer: starship.manufacturer,
            cost_in_credits: starship.cost_in_credits,
            length: starship.length,
            crew: starship.crew,
            passengers: starship.passengers,
            max_atmosphering_speed: starship.max_atmosphering_speed,
            hyperdrive_rating: starship.hyperdrive_rating,
            mglt: starship.mglt,
            cargo_capacity: starship.cargo_capacity,
            consumables: starship.consumables,
            films: starship.films.into_iter().map(FilmId::get).collect(),
            pilots: starship.pilots.into_iter().map(CharacterId::get).collect(),
            created_at: starship.created_at,
            edited_at: starship.edited_at,
        }
    }
}

/// Payload for creating or fully replacing a starship.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StarshipRequest {
    #[serde(default)]
    pub external_id: i64,
    pub name: Option<String>,
    pub model: Option<String>,
    pub starship_class: Option<String>,
    pub manufacturer: Option<String>,
    pub cost_in_credits: Option<String>,
    pub length: Option<String>,
    pub crew: Option<String>,
    pub passengers: Option<String>,
    pub max_atmosphering_speed: Option<String>,
    pub hyperdrive_rating: Option<String>,
    #[serde(rename = "MGLT")]
    pub mglt: Option<String>,
    pub cargo_capacity: Option<String>,
    pub consumables: Option<String>,
    #[serde(default)]
    pub films: Vec<i64>,
    #[serde(default)]
    pub pilots: Vec<i64>,
}

type StarshipParts = (NewStarship, Vec<FilmId>, Vec<CharacterId>);

impl StarshipRequest {
    fn into_parts(self) -> Result<StarshipParts, Error> {
        let starship = NewStarship {
            external_id: parse_external_id(self.external_id, FieldName::new("externalId"))?,
            name: require_field(self.name, FieldName::new("name"))?,
            model: require_field(self.model, FieldName::new("model"))?,
            starship_class: self.starship_class,
            manufacturer: self.manufacturer,
            cost_in_credits: self.cost_in_credits,
            length: self.length,
            crew: self.crew,
            passengers: self.passengers,
            max_atmosphering_speed: self.max_atmosphering_speed,
            hyperdrive_rating: self.hyperdrive_rating,
            mglt: self.mglt,
            cargo_capacity: self.cargo_capacity,
            consumables: self.consumables,
        };
        Ok((starship, film_ids(self.films), pilot_ids(self.pilots)))
    }
}

/// Partial starship update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StarshipPatchRequest {
    pub external_id: Option<i64>,
    pub name: Option<String>,
    pub model: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub starship_class: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub manufacturer: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub cost_in_credits: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub length: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub crew: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub passengers: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub max_atmosphering_speed: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub hyperdrive_rating: Option<Option<String>>,
    #[serde(default, rename = "MGLT", deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub mglt: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub cargo_capacity: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub consumables: Option<Option<String>>,
    pub films: Option<Vec<i64>>,
    pub pilots: Option<Vec<i64>>,
}

impl StarshipPatchRequest {
    fn into_patch(self) -> Result<StarshipPatch, Error> {
        Ok(StarshipPatch {
            external_id: self
                .external_id
                .map(|id| parse_external_id(id, FieldName::new("externalId")))
                .transpose()?,
            name: self.name,
            model: self.model,
            starship_class: self.starship_class,
            manufacturer: self.manufacturer,
            cost_in_credits: self.cost_in_credits,
            length: self.length,
            crew: self.crew,
            passengers: self.passengers,
            max_atmosphering_speed: self.max_atmosphering_speed,
            hyperdrive_rating: self.hyperdrive_rating,
            mglt: self.mglt,
            cargo_capacity: self.cargo_capacity,
            consumables: self.consumables,
            films: self.films.map(film_ids),
            pilots: self.pilots.map(pilot_ids),
        })
    }
}

fn pilot_ids(ids: Vec<i64>) -> Vec<CharacterId> {
    ids.into_iter().map(CharacterId::new).collect()
}

/// List starships ordered by id.
#[utoipa::path(
    get,
    path = "/api/v1/starships",
    params(PageParams),
    responses(
        (status = 200, description = "Page of starships", body = PageBody<StarshipBody>),
        (status = 400, description = "Invalid page parameters", body = Error)
    ),
    tags = ["starships"],
    operation_id = "listStarships",
    security([])
)]
#[get("/starships")]
pub async fn list_starships(
    state: web::Data<HttpState>,
    req: HttpRequest,
    params: web::Query<PageParams>,
) -> ApiResult<web::Json<Page<StarshipBody>>> {
    let request = params.into_inner().to_request()?;
    let slice = state.query.list_starships(request).await?;
    Ok(web::Json(envelope(&req, &request, slice, StarshipBody::from)?))
}

/// Search starships by case-insensitive name substring.
#[utoipa::path(
    get,
    path = "/api/v1/starships/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Page of matching starships", body = PageBody<StarshipBody>),
        (status = 400, description = "Missing or blank name", body = Error)
    ),
    tags = ["starships"],
    operation_id = "searchStarships",
    security([])
)]
#[get("/starships/search")]
pub async fn search_starships(
    state: web::Data<HttpState>,
    req: HttpRequest,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<Page<StarshipBody>>> {
    let params = params.into_inner();
    let request = params.page_params().to_request()?;
    let name = params.name.unwrap_or_default();
    let slice = state.query.search_starships(&name, request).await?;
    Ok(web::Json(envelope(&req, &request, slice, StarshipBody::from)?))
}

#[utoipa::path(
    get,
    path = "/api/v1/starships/{id}",
    params(("id" = i64, Path, description = "Starship id")),
    responses(
        (status = 200, description = "Starship", body = StarshipBody),
        (status = 404, description = "Unknown starship", body = Error)
    ),
    tags = ["starships"],
    operation_id = "getStarship",
    security([])
)]
#[get("/starships/{id}")]
pub async fn get_starship(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
) -> ApiResult<web::Json<StarshipBody>> {
    let starship = state
        .query
        .get_starship(StarshipId::new(id.into_inner()))
        .await?;
    Ok(web::Json(starship.into()))
}

/// Create a starship after checking name and model against the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/starships",
    request_body = StarshipRequest,
    responses(
        (status = 201, description = "Starship created", body = StarshipBody),
        (status = 400, description = "Invalid request or unknown film or pilot id", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Writes disabled", body = Error),
        (status = 409, description = "Name and model already taken", body = Error),
        (status = 503, description = "Catalogue unreachable", body = Error)
    ),
    tags = ["starships"],
    operation_id = "createStarship",
    security(("BearerToken" = []))
)]
#[post("/starships")]
pub async fn create_starship(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    payload: web::Json<StarshipRequest>,
) -> ApiResult<HttpResponse> {
    let (draft, films, pilots) = payload.into_inner().into_parts()?;
    let starship = state.command.create_starship(draft, films, pilots).await?;
    Ok(HttpResponse::Created().json(StarshipBody::from(starship)))
}

#[utoipa::path(
    put,
    path = "/api/v1/starships/{id}",
    params(("id" = i64, Path, description = "Starship id")),
    request_body = StarshipRequest,
    responses(
        (status = 200, description = "Starship replaced", body = StarshipBody),
        (status = 400, description = "Invalid request or unknown film or pilot id", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown starship", body = Error),
        (status = 409, description = "Name and model already taken", body = Error)
    ),
    tags = ["starships"],
    operation_id = "replaceStarship",
    security(("BearerToken" = []))
)]
#[put("/starships/{id}")]
pub async fn replace_starship(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
    payload: web::Json<StarshipRequest>,
) -> ApiResult<web::Json<StarshipBody>> {
    let (draft, films, pilots) = payload.into_inner().into_parts()?;
    let starship = state
        .command
        .replace_starship(StarshipId::new(id.into_inner()), draft, films, pilots)
        .await?;
    Ok(web::Json(starship.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/starships/{id}",
    params(("id" = i64, Path, description = "Starship id")),
    request_body = StarshipPatchRequest,
    responses(
        (status = 200, description = "Starship updated", body = StarshipBody),
        (status = 400, description = "Invalid request or unknown film or pilot id", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown starship", body = Error),
        (status = 409, description = "Name and model already taken", body = Error)
    ),
    tags = ["starships"],
    operation_id = "patchStarship",
    security(("BearerToken" = []))
)]
#[patch("/starships/{id}")]
pub async fn patch_starship(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
    payload: web::Json<StarshipPatchRequest>,
) -> ApiResult<web::Json<StarshipBody>> {
    let patch = payload.into_inner().into_patch()?;
    let starship = state
        .command
        .patch_starship(StarshipId::new(id.into_inner()), patch)
        .await?;
    Ok(web::Json(starship.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/starships/{id}",
    params(("id" = i64, Path, description = "Starship id")),
    responses(
        (status = 204, description = "Starship deleted"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Unknown starship", body = Error)
    ),
    tags = ["starships"],
    operation_id = "deleteStarship",
    security(("BearerToken" = []))
)]
#[delete("/starships/{id}")]
pub async fn delete_starship(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state
        .command
        .delete_starship(StarshipId::new(id.into_inner()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    fn request_requires_a_model() {
        let request = StarshipRequest {
            name: Some("X-wing".to_owned()),
            ..StarshipRequest::default()
        };
        let error = request.into_parts().expect_err("missing model");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn mglt_keeps_its_catalogue_spelling() {
        let request: StarshipRequest = serde_json::from_str(
            r#"{"name":"X-wing","model":"T-65 X-wing","MGLT":"100","pilots":[1]}"#,
        )
        .expect("valid json");

        let (draft, films, pilots) = request.into_parts().expect("valid request");

        assert_eq!(draft.mglt.as_deref(), Some("100"));
        assert!(films.is_empty());
        assert_eq!(pilots, vec![CharacterId::new(1)]);
    }
}
