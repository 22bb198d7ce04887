//! Scripted catalogue source and record builders.
//!
//! Responses are queued per page URL. Each request pops the head of its
//! queue; the final response repeats so repeated syncs see a stable
//! catalogue. Unscripted URLs answer as if the catalogue returned 404.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use pagination::Page;

use crate::domain::ExternalId;
use crate::domain::ports::{
    CatalogueResource, CatalogueSource, CatalogueSourceError, ExternalCharacter, ExternalFilm,
    ExternalStarship, PageResult,
};

/// Base URL served by [`ScriptedCatalogueSource`].
pub const BASE_URL: &str = "https://catalogue.test/api";

/// Canonical URL of a film.
pub fn film_url(id: i64) -> String {
    format!("{BASE_URL}/films/{id}/")
}

/// Canonical URL of a character.
pub fn character_url(id: i64) -> String {
    format!("{BASE_URL}/people/{id}/")
}

/// Canonical URL of a starship.
pub fn starship_url(id: i64) -> String {
    format!("{BASE_URL}/starships/{id}/")
}

/// URL of page `page` (1-based) of a collection.
pub fn page_url(resource: CatalogueResource, page: usize) -> String {
    let first = format!("{BASE_URL}/{}/", resource.path_segment());
    if page <= 1 {
        first
    } else {
        format!("{first}?page={page}")
    }
}

pub fn film(id: i64, title: &str) -> ExternalFilm {
    ExternalFilm {
        url: Some(film_url(id)),
        title: Some(title.to_owned()),
        episode_id: i32::try_from(id).ok(),
        director: Some("George Lucas".to_owned()),
        release_date: Some("1977-05-25".to_owned()),
        ..ExternalFilm::default()
    }
}

pub fn character(id: i64, name: &str, films: &[i64]) -> ExternalCharacter {
    ExternalCharacter {
        url: Some(character_url(id)),
        name: Some(name.to_owned()),
        height: Some("172".to_owned()),
        films: films.iter().copied().map(film_url).collect(),
        ..ExternalCharacter::default()
    }
}

pub fn starship(
    id: i64,
    name: &str,
    model: &str,
    films: &[i64],
    pilots: &[i64],
) -> ExternalStarship {
    ExternalStarship {
        url: Some(starship_url(id)),
        name: Some(name.to_owned()),
        model: Some(model.to_owned()),
        mglt: Some("75".to_owned()),
        films: films.iter().copied().map(film_url).collect(),
        pilots: pilots.iter().copied().map(character_url).collect(),
        ..ExternalStarship::default()
    }
}

#[derive(Clone)]
enum Scripted {
    Films(PageResult<ExternalFilm>),
    Characters(PageResult<ExternalCharacter>),
    Starships(PageResult<ExternalStarship>),
}

/// In-process [`CatalogueSource`] driven by queued responses.
#[derive(Default)]
pub struct ScriptedCatalogueSource {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<String>>,
    single_fetch_error: Mutex<Option<CatalogueSourceError>>,
}

impl ScriptedCatalogueSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the films collection as consecutive pages.
    #[must_use]
    pub fn with_film_pages(self, pages: Vec<Vec<ExternalFilm>>) -> Self {
        for (url, page) in paged(CatalogueResource::Films, pages) {
            self.push(url, Scripted::Films(Ok(Some(page))));
        }
        self
    }

    /// Script the people collection as consecutive pages.
    #[must_use]
    pub fn with_character_pages(self, pages: Vec<Vec<ExternalCharacter>>) -> Self {
        for (url, page) in paged(CatalogueResource::People, pages) {
            self.push(url, Scripted::Characters(Ok(Some(page))));
        }
        self
    }

    /// Script the starships collection as consecutive pages.
    #[must_use]
    pub fn with_starship_pages(self, pages: Vec<Vec<ExternalStarship>>) -> Self {
        for (url, page) in paged(CatalogueResource::Starships, pages) {
            self.push(url, Scripted::Starships(Ok(Some(page))));
        }
        self
    }

    /// Queue a raw films response for `url`.
    pub fn push_film_response(&self, url: &str, response: PageResult<ExternalFilm>) {
        self.push(url.to_owned(), Scripted::Films(response));
    }

    /// Queue a raw people response for `url`.
    pub fn push_character_response(&self, url: &str, response: PageResult<ExternalCharacter>) {
        self.push(url.to_owned(), Scripted::Characters(response));
    }

    /// Queue a raw starships response for `url`.
    pub fn push_starship_response(&self, url: &str, response: PageResult<ExternalStarship>) {
        self.push(url.to_owned(), Scripted::Starships(response));
    }

    /// Make every single-record fetch fail with `error`.
    pub fn fail_single_fetches(&self, error: CatalogueSourceError) {
        *lock(&self.single_fetch_error) = Some(error);
    }

    /// Page URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    fn push(&self, url: String, response: Scripted) {
        lock(&self.responses).entry(url).or_default().push_back(response);
    }

    fn next_response(&self, url: &str) -> Option<Scripted> {
        lock(&self.requests).push(url.to_owned());
        let mut responses = lock(&self.responses);
        let queue = responses.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn single_fetch_error(&self) -> Option<CatalogueSourceError> {
        lock(&self.single_fetch_error).clone()
    }

    fn scripted_records<T>(&self, pick: impl Fn(&Scripted) -> Option<&Page<T>>) -> Vec<T>
    where
        T: Clone,
    {
        lock(&self.responses)
            .values()
            .flat_map(|queue| queue.iter())
            .filter_map(|response| pick(response))
            .flat_map(|page| page.results.iter().cloned())
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("scripted catalogue mutex"),
    }
}

fn paged<T>(resource: CatalogueResource, pages: Vec<Vec<T>>) -> Vec<(String, Page<T>)> {
    let count = pages.iter().map(Vec::len).sum::<usize>();
    let total = pages.len();
    pages
        .into_iter()
        .enumerate()
        .map(|(index, results)| {
            let number = index + 1;
            let page = Page {
                count: u64::try_from(count).unwrap_or(u64::MAX),
                next: (number < total).then(|| page_url(resource, number + 1)),
                previous: (number > 1).then(|| page_url(resource, number - 1)),
                results,
            };
            (page_url(resource, number), page)
        })
        .collect()
}

fn mismatch<T>(url: &str) -> PageResult<T> {
    Err(CatalogueSourceError::decode(format!(
        "scripted response for {url} has another record type"
    )))
}

fn matches_id(url: Option<&str>, id: ExternalId) -> bool {
    url.and_then(|url| crate::domain::external_id_from_url(url).ok()) == Some(id)
}

#[async_trait]
impl CatalogueSource for ScriptedCatalogueSource {
    fn resource_url(&self, resource: CatalogueResource) -> String {
        page_url(resource, 1)
    }

    async fn fetch_film_page(&self, url: &str) -> PageResult<ExternalFilm> {
        match self.next_response(url) {
            None => Ok(None),
            Some(Scripted::Films(response)) => response,
            Some(_) => mismatch(url),
        }
    }

    async fn fetch_character_page(&self, url: &str) -> PageResult<ExternalCharacter> {
        match self.next_response(url) {
            None => Ok(None),
            Some(Scripted::Characters(response)) => response,
            Some(_) => mismatch(url),
        }
    }

    async fn fetch_starship_page(&self, url: &str) -> PageResult<ExternalStarship> {
        match self.next_response(url) {
            None => Ok(None),
            Some(Scripted::Starships(response)) => response,
            Some(_) => mismatch(url),
        }
    }

    async fn fetch_film(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalFilm>, CatalogueSourceError> {
        if let Some(error) = self.single_fetch_error() {
            return Err(error);
        }
        Ok(self
            .scripted_records(|response| match response {
                Scripted::Films(Ok(Some(page))) => Some(page),
                _ => None,
            })
            .into_iter()
            .find(|film| matches_id(film.url.as_deref(), id)))
    }

    async fn fetch_character(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalCharacter>, CatalogueSourceError> {
        if let Some(error) = self.single_fetch_error() {
            return Err(error);
        }
        Ok(self
            .scripted_records(|response| match response {
                Scripted::Characters(Ok(Some(page))) => Some(page),
                _ => None,
            })
            .into_iter()
            .find(|character| matches_id(character.url.as_deref(), id)))
    }

    async fn fetch_starship(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalStarship>, CatalogueSourceError> {
        if let Some(error) = self.single_fetch_error() {
            return Err(error);
        }
        Ok(self
            .scripted_records(|response| match response {
                Scripted::Starships(Ok(Some(page))) => Some(page),
                _ => None,
            })
            .into_iter()
            .find(|starship| matches_id(starship.url.as_deref(), id)))
    }
}
