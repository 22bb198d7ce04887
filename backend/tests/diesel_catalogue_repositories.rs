//! Integration tests for the Diesel catalogue repositories against embedded
//! PostgreSQL.
//!
//! Each test provisions its own migrated database through
//! `pg-embed-setup-unpriv` and drives the repositories on a dedicated Tokio
//! runtime, since the cluster bootstrap must run outside one.

use pagination::PageRequest;
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use starwars_rest::domain::ports::{
    CatalogueRepositoryError, CharacterRepository, FilmRepository, StarshipRepository,
};
use starwars_rest::domain::{ExternalId, Film, FilmId, NewCharacter, NewFilm, NewStarship};
use starwars_rest::outbound::persistence::{
    DbPool, DieselCharacterRepository, DieselFilmRepository, DieselStarshipRepository,
    PoolConfig,
};
use tokio::runtime::Runtime;

#[path = "support/pg_embed.rs"]
mod pg_embed;

use pg_embed::{handle_cluster_setup_failure, migrated_database};

struct TestContext {
    runtime: Runtime,
    films: DieselFilmRepository,
    characters: DieselCharacterRepository,
    starships: DieselStarshipRepository,
    _database: TemporaryDatabase,
}

fn setup_test_context() -> Result<TestContext, String> {
    let database = migrated_database()?;
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let config = PoolConfig::new(database.url())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        films: DieselFilmRepository::new(pool.clone()),
        characters: DieselCharacterRepository::new(pool.clone()),
        starships: DieselStarshipRepository::new(pool),
        _database: database,
    })
}

#[fixture]
fn diesel_world() -> Option<TestContext> {
    match setup_test_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn new_film(external_id: i64, name: &str) -> NewFilm {
    NewFilm {
        external_id: ExternalId::new(external_id),
        name: name.to_owned(),
        ..NewFilm::default()
    }
}

fn new_character(external_id: i64, name: &str) -> NewCharacter {
    NewCharacter {
        external_id: ExternalId::new(external_id),
        name: name.to_owned(),
        ..NewCharacter::default()
    }
}

fn new_starship(external_id: i64, name: &str, model: &str) -> NewStarship {
    NewStarship {
        external_id: ExternalId::new(external_id),
        name: name.to_owned(),
        model: model.to_owned(),
        ..NewStarship::default()
    }
}

async fn seed_films(films: &DieselFilmRepository) -> Vec<Film> {
    films
        .create_batch(&[
            new_film(1, "A New Hope"),
            new_film(2, "The Empire Strikes Back"),
            new_film(3, "Return of the Jedi"),
        ])
        .await
        .expect("seed films")
}

#[rstest]
fn batch_create_returns_records_in_input_order(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        return;
    };
    ctx.runtime.block_on(async {
        let drafts = [
            new_character(13, "Chewbacca"),
            new_character(1, "Luke Skywalker"),
            new_character(5, "Leia Organa"),
        ];

        let created = ctx.characters.create_batch(&drafts).await.expect("batch");

        let identities: Vec<_> = created
            .iter()
            .map(|character| (character.external_id, character.name.as_str()))
            .collect();
        assert_eq!(
            identities,
            vec![
                (ExternalId::new(13), "Chewbacca"),
                (ExternalId::new(1), "Luke Skywalker"),
                (ExternalId::new(5), "Leia Organa"),
            ]
        );
        assert!(created.iter().all(|character| character.films.is_empty()));
    });
}

#[rstest]
fn repeated_external_id_fails_the_whole_batch(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        return;
    };
    ctx.runtime.block_on(async {
        ctx.films
            .create(&new_film(4, "Star Wars"))
            .await
            .expect("seed film");

        let result = ctx
            .films
            .create_batch(&[new_film(5, "The Empire Strikes Back"), new_film(4, "A New Hope")])
            .await;

        assert!(matches!(result, Err(CatalogueRepositoryError::Conflict { .. })));
        let stored = ctx.films.list(PageRequest::default()).await.expect("list");
        assert_eq!(stored.total, 1, "the batch is rolled back as a unit");
    });
}

#[rstest]
fn local_records_do_not_collide_on_external_id(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        return;
    };
    ctx.runtime.block_on(async {
        ctx.characters
            .create(&new_character(0, "Jar Jar Binks"), &[])
            .await
            .expect("first local");
        ctx.characters
            .create(&new_character(0, "Wicket"), &[])
            .await
            .expect("second local");

        let duplicate = ctx
            .characters
            .create(&new_character(0, "Wicket"), &[])
            .await;

        assert!(matches!(
            duplicate,
            Err(CatalogueRepositoryError::Conflict { .. })
        ));
    });
}

#[rstest]
fn replacing_links_has_set_semantics(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        return;
    };
    ctx.runtime.block_on(async {
        let films = seed_films(&ctx.films).await;
        let [hope, empire, jedi] = [films[0].id, films[1].id, films[2].id];
        let han = ctx
            .characters
            .create(&new_character(14, "Han Solo"), &[])
            .await
            .expect("pilot");
        let falcon = ctx
            .starships
            .create(
                &new_starship(10, "Millennium Falcon", "YT-1300 light freighter"),
                &[],
                &[],
            )
            .await
            .expect("starship");

        for _ in 0..2 {
            ctx.starships
                .replace_films(falcon.id, &[jedi, hope, hope])
                .await
                .expect("replace films");
            ctx.starships
                .replace_pilots(falcon.id, &[han.id])
                .await
                .expect("replace pilots");
        }
        let linked = ctx
            .starships
            .find_by_id(falcon.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(linked.films, vec![hope, jedi]);
        assert_eq!(linked.pilots, vec![han.id]);

        ctx.starships
            .replace_films(falcon.id, &[empire])
            .await
            .expect("narrow films");
        let narrowed = ctx
            .starships
            .find_by_id(falcon.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(narrowed.films, vec![empire]);
        assert_eq!(narrowed.pilots, vec![han.id]);
    });
}

#[rstest]
fn unknown_link_target_is_an_invalid_reference(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        return;
    };
    ctx.runtime.block_on(async {
        let luke = ctx
            .characters
            .create(&new_character(1, "Luke Skywalker"), &[])
            .await
            .expect("character");

        let result = ctx
            .characters
            .replace_films(luke.id, &[FilmId::new(9_999)])
            .await;

        assert!(matches!(
            result,
            Err(CatalogueRepositoryError::InvalidReference { .. })
        ));
    });
}

#[rstest]
fn lookups_by_external_id_skip_unknown_identities(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        return;
    };
    ctx.runtime.block_on(async {
        let films = seed_films(&ctx.films).await;
        let luke = ctx
            .characters
            .create(&new_character(1, "Luke Skywalker"), &[films[0].id, films[1].id])
            .await
            .expect("character");
        let wanted = [ExternalId::new(1), ExternalId::new(42)];

        let index = ctx
            .characters
            .ids_by_external_id(&wanted)
            .await
            .expect("index");
        let existing = ctx
            .characters
            .existing_external_ids(&wanted)
            .await
            .expect("existing");
        let stored = ctx
            .characters
            .find_by_external_ids(&wanted)
            .await
            .expect("stored");

        assert_eq!(index.get(&ExternalId::new(1)), Some(&luke.id));
        assert_eq!(index.len(), 1);
        assert!(existing.contains(&ExternalId::new(1)));
        assert!(!existing.contains(&ExternalId::new(42)));
        let stored_films: Vec<_> = stored.iter().map(|character| &character.films).collect();
        assert_eq!(stored_films, vec![&vec![films[0].id, films[1].id]]);
    });
}

#[rstest]
fn deleting_a_film_drops_its_links(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        return;
    };
    ctx.runtime.block_on(async {
        let films = seed_films(&ctx.films).await;
        let luke = ctx
            .characters
            .create(&new_character(1, "Luke Skywalker"), &[films[0].id, films[2].id])
            .await
            .expect("character");

        assert!(ctx.films.delete(films[0].id).await.expect("delete"));

        let reloaded = ctx
            .characters
            .find_by_id(luke.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(reloaded.films, vec![films[2].id]);
    });
}
