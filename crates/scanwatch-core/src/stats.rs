//! Per-species sighting statistics.

use std::collections::BTreeMap;

use scanwatch_db::{DbError, SightingLedger, SightingRecord};
use scanwatch_types::{SightingStat, SpeciesId};
use tracing::warn;

use crate::species::SpeciesNames;

/// Builds the sighting table over the species range `1..=species_count`.
///
/// Seen species come first, most sighted first with ties broken by id. Every
/// other species in the range follows in id order with a zero count.
pub struct StatsAggregator<N> {
    ledger: SightingLedger,
    names: N,
    species_count: u32,
}

impl<N: SpeciesNames> StatsAggregator<N> {
    /// Create an aggregator over `ledger`.
    pub const fn new(ledger: SightingLedger, names: N, species_count: u32) -> Self {
        Self {
            ledger,
            names,
            species_count,
        }
    }

    /// Compute the full table, exactly one entry per species in range.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the ledger cannot be read.
    pub async fn get_stats(&self) -> Result<Vec<SightingStat>, DbError> {
        let records = self.ledger.records().await?;
        Ok(self.assemble(records))
    }

    fn assemble(&self, records: Vec<SightingRecord>) -> Vec<SightingStat> {
        let mut seen: BTreeMap<SpeciesId, SightingRecord> = BTreeMap::new();
        for record in records {
            if !self.in_range(record.species_id) {
                warn!(
                    species_id = %record.species_id,
                    species_count = self.species_count,
                    "ignoring sightings of species outside the known range"
                );
                continue;
            }
            if record.encounter_count > 0 {
                seen.insert(record.species_id, record);
            }
        }

        let mut ranked: Vec<&SightingRecord> = seen.values().collect();
        ranked.sort_by(|a, b| {
            b.encounter_count
                .cmp(&a.encounter_count)
                .then(a.species_id.cmp(&b.species_id))
        });

        let mut stats: Vec<SightingStat> = ranked
            .into_iter()
            .map(|record| SightingStat {
                species_id: record.species_id,
                species_name: self.names.name_for(record.species_id),
                count: record.encounter_count,
                last_seen: record.last_seen,
            })
            .collect();

        stats.extend(
            (1..=self.species_count)
                .map(SpeciesId)
                .filter(|id| !seen.contains_key(id))
                .map(|id| SightingStat::unseen(id, self.names.name_for(id))),
        );
        stats
    }

    fn in_range(&self, species: SpeciesId) -> bool {
        (1..=self.species_count).contains(&species.into_inner())
    }
}
