//! Reqwest-backed catalogue source adapter.
//!
//! This adapter owns transport details only: URL construction, timeout and
//! HTTP status mapping, and JSON decoding into raw catalogue records.
//! Retrying is left to the domain client.

use std::time::Duration;

use async_trait::async_trait;
use pagination::Page;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::dto::{CharacterDto, FilmDto, StarshipDto};
use crate::domain::ExternalId;
use crate::domain::ports::{
    CatalogueResource, CatalogueSource, CatalogueSourceError, ExternalCharacter, ExternalFilm,
    ExternalStarship, PageResult,
};

/// Public Star Wars API root.
pub const DEFAULT_CATALOGUE_URL: &str = "https://swapi.dev/api";
const USER_AGENT: &str = concat!("starwars-rest/", env!("CARGO_PKG_VERSION"));

/// Catalogue source performing HTTP GET requests against one API root.
pub struct SwapiHttpSource {
    client: Client,
    base: String,
}

impl SwapiHttpSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base: base.as_str().trim_end_matches('/').to_owned(),
        })
    }

    fn record_url(&self, resource: CatalogueResource, id: ExternalId) -> String {
        format!("{}/{}/{id}/", self.base, resource.path_segment())
    }

    /// GET `url` and decode the body; `None` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, CatalogueSourceError> {
        debug!(url, "fetching catalogue resource");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        decode(body.as_ref()).map(Some)
    }

    async fn get_page<D, T>(&self, url: &str) -> PageResult<T>
    where
        D: DeserializeOwned,
        T: From<D>,
    {
        let page: Option<Page<D>> = self.get_json(url).await?;
        Ok(page.map(|page| page.map(T::from)))
    }
}

#[async_trait]
impl CatalogueSource for SwapiHttpSource {
    fn resource_url(&self, resource: CatalogueResource) -> String {
        format!("{}/{}/", self.base, resource.path_segment())
    }

    async fn fetch_film_page(&self, url: &str) -> PageResult<ExternalFilm> {
        self.get_page::<FilmDto, _>(url).await
    }

    async fn fetch_character_page(&self, url: &str) -> PageResult<ExternalCharacter> {
        self.get_page::<CharacterDto, _>(url).await
    }

    async fn fetch_starship_page(&self, url: &str) -> PageResult<ExternalStarship> {
        self.get_page::<StarshipDto, _>(url).await
    }

    async fn fetch_film(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalFilm>, CatalogueSourceError> {
        let url = self.record_url(CatalogueResource::Films, id);
        let dto: Option<FilmDto> = self.get_json(&url).await?;
        Ok(dto.map(ExternalFilm::from))
    }

    async fn fetch_character(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalCharacter>, CatalogueSourceError> {
        let url = self.record_url(CatalogueResource::People, id);
        let dto: Option<CharacterDto> = self.get_json(&url).await?;
        Ok(dto.map(ExternalCharacter::from))
    }

    async fn fetch_starship(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalStarship>, CatalogueSourceError> {
        let url = self.record_url(CatalogueResource::Starships, id);
        let dto: Option<StarshipDto> = self.get_json(&url).await?;
        Ok(dto.map(ExternalStarship::from))
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, CatalogueSourceError> {
    serde_json::from_slice(body).map_err(|error| {
        CatalogueSourceError::decode(format!("invalid catalogue JSON payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> CatalogueSourceError {
    if error.is_timeout() {
        CatalogueSourceError::timeout(error.to_string())
    } else if error.is_decode() {
        CatalogueSourceError::decode(error.to_string())
    } else {
        CatalogueSourceError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CatalogueSourceError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => CatalogueSourceError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CatalogueSourceError::timeout(message)
        }
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE => {
            CatalogueSourceError::unavailable(status.as_u16(), message)
        }
        _ => CatalogueSourceError::status(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network catalogue mapping helpers.

    use super::*;
    use rstest::rstest;

    fn source(base: &str) -> SwapiHttpSource {
        let base = Url::parse(base).expect("valid base url");
        SwapiHttpSource::new(&base, Duration::from_secs(10)).expect("client builds")
    }

    #[rstest]
    #[case::plain("https://swapi.dev/api")]
    #[case::trailing_slash("https://swapi.dev/api/")]
    fn builds_collection_and_record_urls(#[case] base: &str) {
        let source = source(base);
        assert_eq!(
            source.resource_url(CatalogueResource::People),
            "https://swapi.dev/api/people/"
        );
        assert_eq!(
            source.record_url(CatalogueResource::Starships, ExternalId::new(9)),
            "https://swapi.dev/api/starships/9/"
        );
    }

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, true)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, true)]
    #[case::internal(StatusCode::INTERNAL_SERVER_ERROR, true)]
    #[case::bad_gateway(StatusCode::BAD_GATEWAY, true)]
    #[case::unavailable(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case::bad_request(StatusCode::BAD_REQUEST, false)]
    #[case::forbidden(StatusCode::FORBIDDEN, false)]
    #[case::not_implemented(StatusCode::NOT_IMPLEMENTED, false)]
    fn maps_statuses_to_retry_classes(#[case] status: StatusCode, #[case] retryable: bool) {
        let error = map_status_error(status, b"{\"detail\":\"busy\"}");
        assert_eq!(error.is_retryable(), retryable);
    }

    #[test]
    fn status_message_carries_a_compact_body_preview() {
        let error = map_status_error(StatusCode::BAD_REQUEST, b"{\n  \"detail\":   \"nope\"\n}");
        assert_eq!(
            error.to_string(),
            "catalogue returned status 400: status 400: { \"detail\": \"nope\" }"
        );
    }

    #[test]
    fn decodes_starship_pages_with_mglt() {
        let body = br#"{
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{
                "name": "X-wing",
                "model": "T-65 X-wing",
                "MGLT": "100",
                "films": ["https://swapi.dev/api/films/1/"],
                "pilots": [],
                "url": "https://swapi.dev/api/starships/12/"
            }]
        }"#;

        let page: Page<StarshipDto> = decode(body).expect("page decodes");
        let page = page.map(ExternalStarship::from);

        assert!(page.is_last());
        let ship = page.results.first().expect("one record");
        assert_eq!(ship.mglt.as_deref(), Some("100"));
        assert_eq!(ship.films.len(), 1);
        assert!(ship.crew.is_none());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let error = decode::<Page<FilmDto>>(b"<html>").expect_err("not json");
        assert!(matches!(error, CatalogueSourceError::Decode { .. }));
    }
}
