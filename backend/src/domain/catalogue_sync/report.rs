//! Run state machine and per-stage reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{CatalogueRepositoryError, CatalogueSourceError};

/// One entity type's fetch, reconcile, create and link cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Films,
    Characters,
    Starships,
}

impl SyncStage {
    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Films => "films",
            Self::Characters => "characters",
            Self::Starships => "starships",
        }
    }
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one run.
///
/// Stages run in the order films, characters, starships so every reference
/// target is stored before anything links to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    FilmsPending,
    CharactersPending,
    StarshipsPending,
    Done,
    /// Absorbing failure state.
    Failed {
        /// Stage that failed.
        stage: SyncStage,
        /// Cause of the failure.
        error: String,
    },
}

impl SyncState {
    /// Stage to run next, if any.
    pub const fn pending_stage(&self) -> Option<SyncStage> {
        match self {
            Self::FilmsPending => Some(SyncStage::Films),
            Self::CharactersPending => Some(SyncStage::Characters),
            Self::StarshipsPending => Some(SyncStage::Starships),
            Self::Done | Self::Failed { .. } => None,
        }
    }

    /// State after the pending stage succeeds.
    #[must_use]
    pub fn advance(self) -> Self {
        match self {
            Self::FilmsPending => Self::CharactersPending,
            Self::CharactersPending => Self::StarshipsPending,
            Self::StarshipsPending | Self::Done => Self::Done,
            failed @ Self::Failed { .. } => failed,
        }
    }

    /// State after the pending stage fails.
    #[must_use]
    pub fn fail(self, error: &StageError) -> Self {
        match self.pending_stage() {
            Some(stage) => Self::Failed {
                stage,
                error: error.to_string(),
            },
            None => self,
        }
    }
}

/// Counts for one completed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    pub stage: SyncStage,
    /// Records read from the catalogue.
    pub fetched: usize,
    /// Records created.
    pub created: usize,
    /// Records already stored or repeated within the fetch.
    pub skipped: usize,
    /// Records that could not be mapped.
    pub invalid: usize,
    /// Relationship rows written for the created records.
    pub linked: usize,
    /// Human readable summary.
    pub status: String,
}

impl StageReport {
    pub(super) fn completed(
        stage: SyncStage,
        fetched: usize,
        created: usize,
        skipped: usize,
        invalid: usize,
        linked: usize,
    ) -> Self {
        let status = if invalid == 0 {
            "ok".to_owned()
        } else {
            format!("ok with {invalid} invalid records")
        };
        Self {
            stage,
            fetched,
            created,
            skipped,
            invalid,
            linked,
            status,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `Done` or `Failed`.
    pub state: SyncState,
    /// Reports of completed stages, in run order.
    pub stages: Vec<StageReport>,
}

impl SyncReport {
    /// Return `true` when every stage completed.
    pub fn succeeded(&self) -> bool {
        self.state == SyncState::Done
    }
}

/// Fatal failure of one stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// The catalogue could not be read.
    #[error("catalogue fetch failed: {0}")]
    Fetch(#[from] CatalogueSourceError),
    /// The store rejected a write or read.
    #[error("store operation failed: {0}")]
    Persist(#[from] CatalogueRepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn states_advance_in_declared_order() {
        let mut state = SyncState::FilmsPending;
        let mut order = Vec::new();
        while let Some(stage) = state.pending_stage() {
            order.push(stage);
            state = state.advance();
        }
        assert_eq!(
            order,
            vec![SyncStage::Films, SyncStage::Characters, SyncStage::Starships]
        );
        assert_eq!(state, SyncState::Done);
    }

    #[rstest]
    fn failure_names_the_pending_stage_and_absorbs() {
        let error = StageError::Fetch(CatalogueSourceError::status(400_u16, "bad request"));
        let failed = SyncState::CharactersPending.fail(&error);

        assert_eq!(
            failed,
            SyncState::Failed {
                stage: SyncStage::Characters,
                error: "catalogue fetch failed: catalogue returned status 400: bad request"
                    .to_owned(),
            }
        );
        assert_eq!(failed.pending_stage(), None);
        assert_eq!(failed.clone().advance(), failed);
    }

    #[rstest]
    fn state_serialises_with_a_tag() {
        let value = serde_json::to_value(SyncState::Failed {
            stage: SyncStage::Starships,
            error: "boom".to_owned(),
        })
        .expect("serialise state");
        assert_eq!(
            value,
            serde_json::json!({"state": "failed", "stage": "starships", "error": "boom"})
        );
    }

    #[rstest]
    #[case::clean(0, "ok")]
    #[case::with_invalid(2, "ok with 2 invalid records")]
    fn status_mentions_invalid_records(#[case] invalid: usize, #[case] expected: &str) {
        let report = StageReport::completed(SyncStage::Films, 6, 4, 0, invalid, 0);
        assert_eq!(report.status, expected);
    }
}
