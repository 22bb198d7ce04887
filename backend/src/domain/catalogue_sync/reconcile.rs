//! Identity reconciliation: which fetched records still need creating.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use super::SyncStage;
use super::mapping::MappingError;
use crate::domain::ExternalId;

/// A fetched record together with its mapped creation attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapped<R, N> {
    /// Raw record, kept for relationship linking.
    pub record: R,
    /// Attributes to persist.
    pub attributes: N,
    /// Catalogue identity read from the record.
    pub external_id: ExternalId,
}

/// Outcome of mapping a fetched batch.
#[derive(Debug)]
pub struct MappedBatch<R, N> {
    /// Records that mapped cleanly, in fetch order.
    pub mapped: Vec<Mapped<R, N>>,
    /// One error per record that could not be mapped.
    pub invalid: Vec<MappingError>,
}

impl<R, N> MappedBatch<R, N> {
    /// Map every record, collecting failures instead of stopping at the first.
    pub fn map_all(
        records: Vec<R>,
        map: impl Fn(&R) -> Result<N, MappingError>,
        external_id: impl Fn(&N) -> ExternalId,
    ) -> Self {
        let mut mapped = Vec::with_capacity(records.len());
        let mut invalid = Vec::new();
        for record in records {
            match map(&record) {
                Ok(attributes) => mapped.push(Mapped {
                    external_id: external_id(&attributes),
                    record,
                    attributes,
                }),
                Err(error) => {
                    warn!(%error, "catalogue record could not be mapped");
                    invalid.push(error);
                }
            }
        }
        Self { mapped, invalid }
    }

    /// Distinct catalogue identities in the batch, ascending.
    ///
    /// Local identities never take part in reconciliation and are left out.
    pub fn external_ids(&self) -> Vec<ExternalId> {
        let mut ids: Vec<_> = self
            .mapped
            .iter()
            .filter_map(|item| item.external_id.catalogue())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Records split into those to create and those skipped.
#[derive(Debug)]
pub struct Reconciliation<R, N> {
    /// Records to create, in fetch order.
    pub create: Vec<Mapped<R, N>>,
    /// First occurrence of each record whose identity is already stored.
    pub stored: Vec<Mapped<R, N>>,
    /// Records already stored or repeated within the batch.
    pub skipped: usize,
}

impl<R, N> Reconciliation<R, N> {
    /// Identities of the records already stored.
    pub fn stored_external_ids(&self) -> Vec<ExternalId> {
        self.stored.iter().map(|item| item.external_id).collect()
    }

    /// Created and stored records, the ones a link pass looks at.
    pub fn linkable(&self) -> impl Iterator<Item = &Mapped<R, N>> {
        self.create.iter().chain(&self.stored)
    }

    /// Raw record of every linkable item keyed by catalogue identity.
    pub fn records_by_identity(&self) -> HashMap<ExternalId, &R> {
        self.linkable()
            .map(|item| (item.external_id, &item.record))
            .collect()
    }
}

/// Split mapped records against the identities already stored.
///
/// A stored identity is always skipped, even when other attributes changed
/// upstream. When the batch repeats an identity only the first occurrence is
/// kept.
pub fn partition<R, N>(
    stage: SyncStage,
    mapped: Vec<Mapped<R, N>>,
    existing: &HashSet<ExternalId>,
) -> Reconciliation<R, N> {
    let mut seen = HashSet::with_capacity(mapped.len());
    let mut create = Vec::with_capacity(mapped.len());
    let mut stored = Vec::new();
    let mut skipped = 0;
    for item in mapped {
        let first = seen.insert(item.external_id);
        if existing.contains(&item.external_id) {
            info!(stage = %stage, external_id = %item.external_id, "record already stored; skipping");
            skipped += 1;
            if first {
                stored.push(item);
            }
        } else if !first {
            info!(stage = %stage, external_id = %item.external_id, "record repeated in fetch; skipping");
            skipped += 1;
        } else {
            create.push(item);
        }
    }
    Reconciliation {
        create,
        stored,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mapped(id: i64, label: &'static str) -> Mapped<&'static str, &'static str> {
        Mapped {
            record: label,
            attributes: label,
            external_id: ExternalId::new(id),
        }
    }

    #[rstest]
    fn stored_identities_are_skipped() {
        let existing = HashSet::from([ExternalId::new(1)]);
        let outcome = partition(
            SyncStage::Films,
            vec![mapped(1, "A New Hope"), mapped(2, "The Empire Strikes Back")],
            &existing,
        );

        assert_eq!(outcome.skipped, 1);
        let created: Vec<_> = outcome.create.iter().map(|item| item.attributes).collect();
        assert_eq!(created, vec!["The Empire Strikes Back"]);
    }

    #[rstest]
    fn first_occurrence_wins_within_a_batch() {
        let outcome = partition(
            SyncStage::Characters,
            vec![mapped(5, "first"), mapped(6, "other"), mapped(5, "second")],
            &HashSet::new(),
        );

        assert_eq!(outcome.skipped, 1);
        let created: Vec<_> = outcome.create.iter().map(|item| item.attributes).collect();
        assert_eq!(created, vec!["first", "other"]);
    }

    #[rstest]
    fn stored_records_are_kept_once_for_linking() {
        let existing = HashSet::from([ExternalId::new(4)]);
        let outcome = partition(
            SyncStage::Starships,
            vec![mapped(4, "stored"), mapped(7, "new"), mapped(4, "again")],
            &existing,
        );

        assert_eq!(outcome.skipped, 2);
        let stored: Vec<_> = outcome.stored.iter().map(|item| item.attributes).collect();
        assert_eq!(stored, vec!["stored"]);
    }

    #[rstest]
    fn mapping_failures_are_collected() {
        let batch = MappedBatch::map_all(
            vec![1_i64, -1, 2],
            |raw| {
                if *raw > 0 {
                    Ok(*raw)
                } else {
                    Err(MappingError::MissingUrl)
                }
            },
            |raw| ExternalId::new(*raw),
        );

        assert_eq!(batch.mapped.len(), 2);
        assert_eq!(batch.invalid, vec![MappingError::MissingUrl]);
        assert_eq!(batch.external_ids(), vec![ExternalId::new(1), ExternalId::new(2)]);
    }

    #[rstest]
    fn external_ids_are_distinct_and_exclude_local() {
        let batch = MappedBatch {
            mapped: vec![mapped(3, "a"), mapped(0, "local"), mapped(3, "b"), mapped(1, "c")],
            invalid: Vec::new(),
        };
        assert_eq!(batch.external_ids(), vec![ExternalId::new(1), ExternalId::new(3)]);
    }
}
