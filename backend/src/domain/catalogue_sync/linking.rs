//! Relationship linking: resolving reference URLs into store ids.
//!
//! A link pass fills each relationship set that is still empty on a stored
//! record. Freshly created records always qualify; records created by an
//! earlier run whose link pass failed qualify again, so re-running a sync
//! retries their links. Populated sets are left alone.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::domain::ports::{
    CatalogueRepositoryError, CharacterRepository, ExternalCharacter, ExternalStarship,
    StarshipRepository,
};
use crate::domain::{
    Character, CharacterId, ExternalId, FilmId, Starship, external_id_from_url,
};

/// Distinct catalogue identities referenced by `urls`, ascending.
///
/// Unparseable URLs are left out; they can never resolve.
pub fn referenced_external_ids<'a>(urls: impl IntoIterator<Item = &'a String>) -> Vec<ExternalId> {
    let mut ids: Vec<_> = urls
        .into_iter()
        .filter_map(|url| external_id_from_url(url).ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Resolve reference URLs through an identity index.
///
/// Unparseable and unresolved references are dropped. The result is sorted
/// and free of duplicates, so replacing a relationship set with it is
/// idempotent.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use starwars_rest::domain::ExternalId;
/// use starwars_rest::domain::catalogue_sync::resolve_references;
///
/// let index = HashMap::from([(ExternalId::new(1), 10_i64)]);
/// let urls = vec![
///     "https://swapi.dev/api/films/1/".to_owned(),
///     "https://swapi.dev/api/films/99/".to_owned(),
/// ];
/// assert_eq!(resolve_references(&urls, &index), vec![10]);
/// ```
pub fn resolve_references<Id, S>(urls: &[String], index: &HashMap<ExternalId, Id, S>) -> Vec<Id>
where
    Id: Copy + Ord,
    S: BuildHasher,
{
    let mut resolved: Vec<Id> = urls
        .iter()
        .filter_map(|url| {
            let Ok(external_id) = external_id_from_url(url) else {
                debug!(url = %url, "dropping unparseable reference");
                return None;
            };
            let found = index.get(&external_id).copied();
            if found.is_none() {
                debug!(url = %url, %external_id, "dropping unresolved reference");
            }
            found
        })
        .collect();
    resolved.sort_unstable();
    resolved.dedup();
    resolved
}

/// Link `character` to the films its catalogue record references.
///
/// Replaces the film set with the resolved references when the stored set
/// is empty and something resolved. Returns the number of links written.
///
/// # Errors
///
/// Returns the store error when the replace fails.
pub async fn link_character<S>(
    characters: &dyn CharacterRepository,
    record: &ExternalCharacter,
    character: &Character,
    film_index: &HashMap<ExternalId, FilmId, S>,
) -> Result<usize, CatalogueRepositoryError>
where
    S: BuildHasher + Sync,
{
    if !character.films.is_empty() {
        return Ok(0);
    }
    let films = resolve_references(&record.films, film_index);
    if films.is_empty() {
        return Ok(0);
    }
    characters.replace_films(character.id, &films).await?;
    Ok(films.len())
}

/// Link `starship` to the films and pilots its catalogue record references.
///
/// Film and pilot sets are filled independently, each only when empty.
/// Returns the number of links written.
///
/// # Errors
///
/// Returns the store error when either replace fails.
pub async fn link_starship<F, P>(
    starships: &dyn StarshipRepository,
    record: &ExternalStarship,
    starship: &Starship,
    film_index: &HashMap<ExternalId, FilmId, F>,
    pilot_index: &HashMap<ExternalId, CharacterId, P>,
) -> Result<usize, CatalogueRepositoryError>
where
    F: BuildHasher + Sync,
    P: BuildHasher + Sync,
{
    let mut linked = 0;
    if starship.films.is_empty() {
        let films = resolve_references(&record.films, film_index);
        if !films.is_empty() {
            starships.replace_films(starship.id, &films).await?;
            linked += films.len();
        }
    }
    if starship.pilots.is_empty() {
        let pilots = resolve_references(&record.pilots, pilot_index);
        if !pilots.is_empty() {
            starships.replace_pilots(starship.id, &pilots).await?;
            linked += pilots.len();
        }
    }
    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::ports::FilmRepository;
    use crate::domain::{NewCharacter, NewFilm, NewStarship};
    use crate::outbound::memory::InMemoryCatalogueStore;
    use crate::test_support::catalogue_source::{character, character_url, film_url, starship};
    use crate::test_support::retry::MutableClock;
    use rstest::rstest;

    #[rstest]
    fn dangling_and_malformed_references_are_dropped() {
        let index = HashMap::from([(ExternalId::new(1), 11_i64), (ExternalId::new(2), 12)]);
        let urls = vec![
            film_url(2),
            film_url(99),
            "not a url".to_owned(),
            film_url(1),
            film_url(2),
        ];
        assert_eq!(resolve_references(&urls, &index), vec![11, 12]);
    }

    #[rstest]
    fn referenced_ids_are_distinct() {
        let urls = [character_url(4), character_url(1), character_url(4)];
        assert_eq!(
            referenced_external_ids(&urls),
            vec![ExternalId::new(1), ExternalId::new(4)]
        );
    }

    #[rstest]
    fn empty_index_resolves_nothing() {
        let index: HashMap<ExternalId, i64> = HashMap::new();
        assert!(resolve_references(&[film_url(1)], &index).is_empty());
    }

    struct Stored {
        store: Arc<InMemoryCatalogueStore>,
        films: HashMap<ExternalId, FilmId>,
        pilots: HashMap<ExternalId, CharacterId>,
    }

    async fn stored_saga() -> Stored {
        let store = Arc::new(InMemoryCatalogueStore::new(Arc::new(MutableClock::fixed())));
        let mut films = HashMap::new();
        for (id, name) in [(1, "A New Hope"), (2, "The Empire Strikes Back")] {
            let film = FilmRepository::create(
                store.as_ref(),
                &NewFilm {
                    external_id: ExternalId::new(id),
                    name: name.to_owned(),
                    ..NewFilm::default()
                },
            )
            .await
            .expect("film");
            films.insert(ExternalId::new(id), film.id);
        }
        let han = CharacterRepository::create(
            store.as_ref(),
            &NewCharacter {
                external_id: ExternalId::new(14),
                name: "Han Solo".to_owned(),
                ..NewCharacter::default()
            },
            &[],
        )
        .await
        .expect("pilot");
        let pilots = HashMap::from([(ExternalId::new(14), han.id)]);
        Stored {
            store,
            films,
            pilots,
        }
    }

    #[tokio::test]
    async fn linking_a_starship_twice_keeps_the_same_sets() {
        let stored = stored_saga().await;
        let record = starship(
            10,
            "Millennium Falcon",
            "YT-1300 light freighter",
            &[2, 1, 99],
            &[14, 13],
        );
        let falcon = StarshipRepository::create(
            stored.store.as_ref(),
            &NewStarship {
                external_id: ExternalId::new(10),
                name: "Millennium Falcon".to_owned(),
                model: "YT-1300 light freighter".to_owned(),
                ..NewStarship::default()
            },
            &[],
            &[],
        )
        .await
        .expect("starship");

        let first = link_starship(
            stored.store.as_ref(),
            &record,
            &falcon,
            &stored.films,
            &stored.pilots,
        )
        .await
        .expect("first link");
        let after_first = StarshipRepository::find_by_id(stored.store.as_ref(), falcon.id)
            .await
            .expect("find")
            .expect("present");
        let second = link_starship(
            stored.store.as_ref(),
            &record,
            &falcon,
            &stored.films,
            &stored.pilots,
        )
        .await
        .expect("second link");
        let after_second = StarshipRepository::find_by_id(stored.store.as_ref(), falcon.id)
            .await
            .expect("find")
            .expect("present");

        assert_eq!((first, second), (3, 3));
        assert_eq!(after_first.films.len(), 2);
        assert_eq!(after_first.pilots.len(), 1);
        assert_eq!(after_second.films, after_first.films);
        assert_eq!(after_second.pilots, after_first.pilots);
    }

    #[tokio::test]
    async fn populated_sets_are_left_alone() {
        let stored = stored_saga().await;
        let luke = CharacterRepository::create(
            stored.store.as_ref(),
            &NewCharacter {
                external_id: ExternalId::new(1),
                name: "Luke Skywalker".to_owned(),
                ..NewCharacter::default()
            },
            &[stored.films[&ExternalId::new(1)]],
        )
        .await
        .expect("character");

        let linked = link_character(
            stored.store.as_ref(),
            &character(1, "Luke Skywalker", &[1, 2]),
            &luke,
            &stored.films,
        )
        .await
        .expect("link");

        assert_eq!(linked, 0);
        let reloaded = CharacterRepository::find_by_id(stored.store.as_ref(), luke.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(reloaded.films, luke.films);
    }
}
