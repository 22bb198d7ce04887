//! Driven port for reading the upstream Star Wars catalogue.
//!
//! The domain owns the raw record shapes so the mapper, reconciler and linker
//! stay adapter-agnostic. Adapters decode wire payloads into these types and
//! report failures as [`CatalogueSourceError`].

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use pagination::Page;

use super::define_port_error;
use crate::domain::ExternalId;

/// Collections exposed by the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogueResource {
    /// `/films/`
    Films,
    /// `/people/`
    People,
    /// `/starships/`
    Starships,
}

impl CatalogueResource {
    /// Path segment of the collection.
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Films => "films",
            Self::People => "people",
            Self::Starships => "starships",
        }
    }
}

/// A film as published by the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalFilm {
    /// Canonical resource URL ending in the catalogue identity.
    pub url: Option<String>,
    /// Film title.
    pub title: Option<String>,
    /// Episode number.
    pub episode_id: Option<i32>,
    /// Opening crawl text.
    pub opening_crawl: Option<String>,
    /// Director credit.
    pub director: Option<String>,
    /// Producer credit.
    pub producer: Option<String>,
    /// Release date as published, usually `YYYY-MM-DD`.
    pub release_date: Option<String>,
}

/// A character (`people` resource) as published by the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCharacter {
    /// Canonical resource URL.
    pub url: Option<String>,
    /// Character name.
    pub name: Option<String>,
    /// Birth year label.
    pub birth_year: Option<String>,
    /// Eye colour.
    pub eye_color: Option<String>,
    /// Gender label.
    pub gender: Option<String>,
    /// Hair colour.
    pub hair_color: Option<String>,
    /// Height as published; may be `unknown`.
    pub height: Option<String>,
    /// Mass label.
    pub mass: Option<String>,
    /// Skin colour.
    pub skin_color: Option<String>,
    /// Homeworld resource URL or label.
    pub homeworld: Option<String>,
    /// Resource URLs of films the character appears in.
    pub films: Vec<String>,
}

/// A starship as published by the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalStarship {
    /// Canonical resource URL.
    pub url: Option<String>,
    /// Starship name.
    pub name: Option<String>,
    /// Model designation.
    pub model: Option<String>,
    /// Class.
    pub starship_class: Option<String>,
    /// Manufacturer credit.
    pub manufacturer: Option<String>,
    /// Cost label.
    pub cost_in_credits: Option<String>,
    /// Length label.
    pub length: Option<String>,
    /// Crew label.
    pub crew: Option<String>,
    /// Passenger label.
    pub passengers: Option<String>,
    /// Atmospheric speed label.
    pub max_atmosphering_speed: Option<String>,
    /// Hyperdrive rating label.
    pub hyperdrive_rating: Option<String>,
    /// Megalights per hour, published as `MGLT`.
    pub mglt: Option<String>,
    /// Cargo capacity label.
    pub cargo_capacity: Option<String>,
    /// Consumables label.
    pub consumables: Option<String>,
    /// Resource URLs of films the starship appears in.
    pub films: Vec<String>,
    /// Resource URLs of characters who piloted it.
    pub pilots: Vec<String>,
}

define_port_error! {
    /// Errors surfaced while reading the catalogue.
    pub enum CatalogueSourceError {
        /// The connection failed before a response arrived.
        Transport { message: String } =>
            "catalogue transport failed: {message}",
        /// The call timed out, locally or upstream.
        Timeout { message: String } =>
            "catalogue timeout: {message}",
        /// The catalogue rate-limited the request.
        RateLimited { message: String } =>
            "catalogue rate limited request: {message}",
        /// The catalogue reported a transient server failure.
        Unavailable { status: u16, message: String } =>
            "catalogue unavailable ({status}): {message}",
        /// The catalogue answered with a status that retrying will not fix.
        Status { status: u16, message: String } =>
            "catalogue returned status {status}: {message}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "catalogue response decode failed: {message}",
    }
}

impl CatalogueSourceError {
    /// Return whether retrying this error is expected to help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Timeout { .. }
                | Self::RateLimited { .. }
                | Self::Unavailable { .. }
        )
    }
}

/// Page of records, or `None` when the catalogue answered 404.
pub type PageResult<T> = Result<Option<Page<T>>, CatalogueSourceError>;

/// Port for reading catalogue pages and single records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueSource: Send + Sync {
    /// Absolute URL of the first page of `resource`.
    fn resource_url(&self, resource: CatalogueResource) -> String;

    /// Fetch one page of films from an absolute page URL.
    async fn fetch_film_page(&self, url: &str) -> PageResult<ExternalFilm>;

    /// Fetch one page of characters from an absolute page URL.
    async fn fetch_character_page(&self, url: &str) -> PageResult<ExternalCharacter>;

    /// Fetch one page of starships from an absolute page URL.
    async fn fetch_starship_page(&self, url: &str) -> PageResult<ExternalStarship>;

    /// Fetch one film by catalogue identity; `None` when unknown.
    async fn fetch_film(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalFilm>, CatalogueSourceError>;

    /// Fetch one character by catalogue identity; `None` when unknown.
    async fn fetch_character(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalCharacter>, CatalogueSourceError>;

    /// Fetch one starship by catalogue identity; `None` when unknown.
    async fn fetch_starship(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalStarship>, CatalogueSourceError>;
}

/// A raw catalogue record type with its page accessor.
///
/// Lets the pager drain any collection without knowing which one it reads.
pub trait CatalogueRecord: Send + Sized + 'static {
    /// Collection the record belongs to.
    const RESOURCE: CatalogueResource;

    /// Canonical resource URL of this record.
    fn url(&self) -> Option<&str>;

    /// Fetch one page of this record type.
    fn fetch_page<'a>(
        source: &'a dyn CatalogueSource,
        url: &'a str,
    ) -> BoxFuture<'a, PageResult<Self>>;
}

impl CatalogueRecord for ExternalFilm {
    const RESOURCE: CatalogueResource = CatalogueResource::Films;

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn fetch_page<'a>(
        source: &'a dyn CatalogueSource,
        url: &'a str,
    ) -> BoxFuture<'a, PageResult<Self>> {
        source.fetch_film_page(url)
    }
}

impl CatalogueRecord for ExternalCharacter {
    const RESOURCE: CatalogueResource = CatalogueResource::People;

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn fetch_page<'a>(
        source: &'a dyn CatalogueSource,
        url: &'a str,
    ) -> BoxFuture<'a, PageResult<Self>> {
        source.fetch_character_page(url)
    }
}

impl CatalogueRecord for ExternalStarship {
    const RESOURCE: CatalogueResource = CatalogueResource::Starships;

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn fetch_page<'a>(
        source: &'a dyn CatalogueSource,
        url: &'a str,
    ) -> BoxFuture<'a, PageResult<Self>> {
        source.fetch_starship_page(url)
    }
}

/// Fixture source serving an empty catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureCatalogueSource;

#[async_trait]
impl CatalogueSource for FixtureCatalogueSource {
    fn resource_url(&self, resource: CatalogueResource) -> String {
        format!("fixture://catalogue/{}/", resource.path_segment())
    }

    async fn fetch_film_page(&self, _url: &str) -> PageResult<ExternalFilm> {
        Ok(None)
    }

    async fn fetch_character_page(&self, _url: &str) -> PageResult<ExternalCharacter> {
        Ok(None)
    }

    async fn fetch_starship_page(&self, _url: &str) -> PageResult<ExternalStarship> {
        Ok(None)
    }

    async fn fetch_film(
        &self,
        _id: ExternalId,
    ) -> Result<Option<ExternalFilm>, CatalogueSourceError> {
        Ok(None)
    }

    async fn fetch_character(
        &self,
        _id: ExternalId,
    ) -> Result<Option<ExternalCharacter>, CatalogueSourceError> {
        Ok(None)
    }

    async fn fetch_starship(
        &self,
        _id: ExternalId,
    ) -> Result<Option<ExternalStarship>, CatalogueSourceError> {
        Ok(None)
    }
}
