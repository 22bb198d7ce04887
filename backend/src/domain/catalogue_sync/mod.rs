//! Catalogue synchronisation engine.
//!
//! Mirrors the upstream catalogue into the store one entity type at a time:
//! fetch every page, reconcile against stored catalogue identities, create
//! the missing records in one atomic batch, then link records to films and
//! pilots already stored. Stored attributes are never modified and records
//! are never removed; only empty relationship sets get filled, so repeated
//! runs converge and a run that failed while linking is completed by the
//! next one.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::catalogue_client::CatalogueClient;
use crate::domain::ports::{
    CharacterRepository, ExternalCharacter, ExternalFilm, ExternalStarship, FilmRepository,
    ResponseCache, StarshipRepository,
};

mod linking;
mod mapping;
mod reconcile;
mod report;
mod runner;

pub use linking::{link_character, link_starship, referenced_external_ids, resolve_references};
pub use mapping::{
    MappingError, map_character, map_film, map_starship, parse_height, parse_release_date,
    record_external_id,
};
pub use reconcile::{Mapped, MappedBatch, Reconciliation, partition};
pub use report::{StageError, StageReport, SyncReport, SyncStage, SyncState};
pub use runner::BackgroundCatalogueSync;

/// Options for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Stop reading each collection once this many records were fetched.
    pub limit: Option<usize>,
}

/// Store and cache ports used by the engine.
pub struct CatalogueSyncPorts {
    pub films: Arc<dyn FilmRepository>,
    pub characters: Arc<dyn CharacterRepository>,
    pub starships: Arc<dyn StarshipRepository>,
    /// Invalidated after every stage that wrote to the store.
    pub cache: Arc<dyn ResponseCache>,
}

/// Runs synchronisation stages against the catalogue and the store.
pub struct CatalogueSyncService {
    client: CatalogueClient,
    films: Arc<dyn FilmRepository>,
    characters: Arc<dyn CharacterRepository>,
    starships: Arc<dyn StarshipRepository>,
    cache: Arc<dyn ResponseCache>,
    clock: Arc<dyn Clock>,
}

impl CatalogueSyncService {
    pub fn new(client: CatalogueClient, ports: CatalogueSyncPorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            films: ports.films,
            characters: ports.characters,
            starships: ports.starships,
            cache: ports.cache,
            clock,
        }
    }

    /// Run every stage in order, stopping at the first fatal failure.
    ///
    /// Stages that completed before a failure stay committed.
    pub async fn run(&self, run_id: Uuid, options: SyncOptions) -> SyncReport {
        let started_at = self.clock.utc();
        info!(%run_id, limit = ?options.limit, "catalogue sync started");

        let mut state = SyncState::FilmsPending;
        let mut stages = Vec::new();
        while let Some(stage) = state.pending_stage() {
            match self.run_stage(stage, options).await {
                Ok(report) => {
                    info!(
                        %run_id,
                        stage = %stage,
                        fetched = report.fetched,
                        created = report.created,
                        skipped = report.skipped,
                        invalid = report.invalid,
                        linked = report.linked,
                        "catalogue sync stage completed"
                    );
                    stages.push(report);
                    state = state.advance();
                }
                Err(error) => {
                    warn!(%run_id, stage = %stage, %error, "catalogue sync stage failed");
                    state = state.fail(&error);
                }
            }
        }

        info!(%run_id, state = ?state, "catalogue sync finished");
        SyncReport {
            run_id,
            started_at,
            finished_at: self.clock.utc(),
            state,
            stages,
        }
    }

    /// Run a single stage.
    ///
    /// The response cache is invalidated when the stage created or linked
    /// records, and after any failure, since a failed stage may already have
    /// committed its batch.
    ///
    /// # Errors
    ///
    /// Returns [`StageError`] when fetching or persisting fails.
    pub async fn run_stage(
        &self,
        stage: SyncStage,
        options: SyncOptions,
    ) -> Result<StageReport, StageError> {
        let result = match stage {
            SyncStage::Films => self.run_films_stage(options).await,
            SyncStage::Characters => self.run_characters_stage(options).await,
            SyncStage::Starships => self.run_starships_stage(options).await,
        };
        let untouched = result
            .as_ref()
            .is_ok_and(|report| report.created == 0 && report.linked == 0);
        if !untouched {
            self.invalidate_cache(stage).await;
        }
        result
    }

    async fn run_films_stage(&self, options: SyncOptions) -> Result<StageReport, StageError> {
        let records = self.client.fetch_all::<ExternalFilm>(options.limit).await?;
        let fetched = records.len();
        let batch = MappedBatch::map_all(records, map_film, |film| film.external_id);
        let existing = self
            .films
            .existing_external_ids(&batch.external_ids())
            .await?;
        let outcome = partition(SyncStage::Films, batch.mapped, &existing);

        let attributes: Vec<_> = outcome
            .create
            .iter()
            .map(|item| item.attributes.clone())
            .collect();
        let created = self.films.create_batch(&attributes).await?;

        Ok(StageReport::completed(
            SyncStage::Films,
            fetched,
            created.len(),
            outcome.skipped,
            batch.invalid.len(),
            0,
        ))
    }

    async fn run_characters_stage(&self, options: SyncOptions) -> Result<StageReport, StageError> {
        let records = self
            .client
            .fetch_all::<ExternalCharacter>(options.limit)
            .await?;
        let fetched = records.len();
        let batch = MappedBatch::map_all(records, map_character, |character| {
            character.external_id
        });
        let existing = self
            .characters
            .existing_external_ids(&batch.external_ids())
            .await?;
        let outcome = partition(SyncStage::Characters, batch.mapped, &existing);

        let attributes: Vec<_> = outcome
            .create
            .iter()
            .map(|item| item.attributes.clone())
            .collect();
        let created = self.characters.create_batch(&attributes).await?;
        let stored = self
            .characters
            .find_by_external_ids(&outcome.stored_external_ids())
            .await?;

        let film_index = self
            .films
            .ids_by_external_id(&referenced_external_ids(
                outcome.linkable().flat_map(|item| &item.record.films),
            ))
            .await?;
        let records = outcome.records_by_identity();
        let mut linked = 0;
        for character in created.iter().chain(&stored) {
            let Some(record) = records.get(&character.external_id) else {
                continue;
            };
            linked +=
                link_character(self.characters.as_ref(), record, character, &film_index).await?;
        }

        Ok(StageReport::completed(
            SyncStage::Characters,
            fetched,
            created.len(),
            outcome.skipped,
            batch.invalid.len(),
            linked,
        ))
    }

    async fn run_starships_stage(&self, options: SyncOptions) -> Result<StageReport, StageError> {
        let records = self
            .client
            .fetch_all::<ExternalStarship>(options.limit)
            .await?;
        let fetched = records.len();
        let batch = MappedBatch::map_all(records, map_starship, |starship| starship.external_id);
        let existing = self
            .starships
            .existing_external_ids(&batch.external_ids())
            .await?;
        let outcome = partition(SyncStage::Starships, batch.mapped, &existing);

        let attributes: Vec<_> = outcome
            .create
            .iter()
            .map(|item| item.attributes.clone())
            .collect();
        let created = self.starships.create_batch(&attributes).await?;
        let stored = self
            .starships
            .find_by_external_ids(&outcome.stored_external_ids())
            .await?;

        let film_index = self
            .films
            .ids_by_external_id(&referenced_external_ids(
                outcome.linkable().flat_map(|item| &item.record.films),
            ))
            .await?;
        let pilot_index = self
            .characters
            .ids_by_external_id(&referenced_external_ids(
                outcome.linkable().flat_map(|item| &item.record.pilots),
            ))
            .await?;
        let records = outcome.records_by_identity();
        let mut linked = 0;
        for starship in created.iter().chain(&stored) {
            let Some(record) = records.get(&starship.external_id) else {
                continue;
            };
            linked += link_starship(
                self.starships.as_ref(),
                record,
                starship,
                &film_index,
                &pilot_index,
            )
            .await?;
        }

        Ok(StageReport::completed(
            SyncStage::Starships,
            fetched,
            created.len(),
            outcome.skipped,
            batch.invalid.len(),
            linked,
        ))
    }

    async fn invalidate_cache(&self, stage: SyncStage) {
        if let Err(error) = self.cache.invalidate_all().await {
            warn!(stage = %stage, %error, "response cache invalidation failed");
        }
    }
}
