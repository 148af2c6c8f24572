//! Per-species sighting records.
//!
//! Every stored creature adds its encoded encounter id to the species hash
//! `scanwatch:stats:{species_id}` and stamps `scanwatch:seen:{species_id}`
//! with the wall-clock time. Neither key expires, so counts outlive the
//! creatures themselves. The two writes are not atomic as a group; readers
//! recompute from whatever is present.
//!
//! Both prefixes carry the `scanwatch:` application namespace so the keys
//! can share a database with other tenants.

use chrono::{DateTime, Utc};
use scanwatch_types::{EncounterId, SpeciesId};

use crate::error::DbError;
use crate::store::StoreHandle;

/// Key prefix of the per-species encounter hashes.
pub const STATS_PREFIX: &str = "scanwatch:stats:";

/// Key prefix of the per-species last-seen timestamps.
pub const SEEN_PREFIX: &str = "scanwatch:seen:";

/// Raw sighting data for one species, as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SightingRecord {
    /// Species the record belongs to.
    pub species_id: SpeciesId,
    /// Distinct encounters recorded.
    pub encounter_count: u64,
    /// Last time the species was stored, if the timestamp key exists.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Reader and writer for the sighting keys.
#[derive(Clone)]
pub struct SightingLedger {
    store: StoreHandle,
}

impl SightingLedger {
    /// Create a ledger over `store`.
    pub const fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Record that `encounter` of `species` was stored at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if either write fails.
    pub async fn record(
        &self,
        species: SpeciesId,
        encounter: EncounterId,
        at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        self.store
            .add_hash_field(&stats_key(species), &encounter.encode())
            .await?;
        self.store
            .set_value(
                &seen_key(species),
                &at.timestamp_millis().to_string(),
                None,
            )
            .await
    }

    /// Read the record of every species that has at least one sighting.
    ///
    /// Keys whose suffix is not a species id are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if any read fails.
    pub async fn records(&self) -> Result<Vec<SightingRecord>, DbError> {
        let keys = self.store.scan_keys(STATS_PREFIX).await?;
        let mut records = Vec::with_capacity(keys.len());

        for key in &keys {
            let Some(species_id) = parse_species_suffix(key) else {
                tracing::warn!(key, "ignoring stats key without a species id");
                continue;
            };
            let encounter_count = self.store.hash_len(key).await?;
            let last_seen = self
                .store
                .get_value(&seen_key(species_id))
                .await?
                .and_then(|raw| parse_seen(&raw));

            records.push(SightingRecord {
                species_id,
                encounter_count,
                last_seen,
            });
        }

        Ok(records)
    }
}

/// Hash key holding the encounters of `species`.
pub fn stats_key(species: SpeciesId) -> String {
    format!("{STATS_PREFIX}{species}")
}

/// Key holding the last-seen timestamp of `species`.
pub fn seen_key(species: SpeciesId) -> String {
    format!("{SEEN_PREFIX}{species}")
}

fn parse_species_suffix(key: &str) -> Option<SpeciesId> {
    key.strip_prefix(STATS_PREFIX)?
        .parse::<u32>()
        .ok()
        .map(SpeciesId)
}

fn parse_seen(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_distinct_encounters_per_species() {
        let ledger = SightingLedger::new(StoreHandle::memory());
        let at = DateTime::from_timestamp_millis(1_469_000_000_000).unwrap_or_default();

        for encounter in [1_u64, 2, 2, 3] {
            let recorded = ledger.record(SpeciesId(16), EncounterId(encounter), at).await;
            assert!(recorded.is_ok());
        }
        assert!(ledger.record(SpeciesId(19), EncounterId(9), at).await.is_ok());

        let mut records = ledger.records().await.unwrap_or_default();
        records.sort_by_key(|r| r.species_id);
        let summary: Vec<(SpeciesId, u64, Option<DateTime<Utc>>)> = records
            .iter()
            .map(|r| (r.species_id, r.encounter_count, r.last_seen))
            .collect();
        assert_eq!(
            summary,
            vec![(SpeciesId(16), 3, Some(at)), (SpeciesId(19), 1, Some(at))]
        );
    }

    #[tokio::test]
    async fn last_seen_tracks_latest_write() {
        let ledger = SightingLedger::new(StoreHandle::memory());
        let first = DateTime::from_timestamp_millis(1_000).unwrap_or_default();
        let second = DateTime::from_timestamp_millis(2_000).unwrap_or_default();

        assert!(ledger.record(SpeciesId(1), EncounterId(1), first).await.is_ok());
        assert!(ledger.record(SpeciesId(1), EncounterId(2), second).await.is_ok());

        let records = ledger.records().await.unwrap_or_default();
        assert_eq!(records.first().and_then(|r| r.last_seen), Some(second));
    }

    #[tokio::test]
    async fn keys_live_under_the_application_namespace() {
        let store = StoreHandle::memory();
        let ledger = SightingLedger::new(store.clone());
        let at = DateTime::from_timestamp_millis(1_000).unwrap_or_default();

        // Another tenant's data sharing the database.
        assert!(store.add_hash_field("stats:16", "foreign").await.is_ok());
        assert!(store.set_value("seen:16", "5", None).await.is_ok());
        assert!(ledger.record(SpeciesId(16), EncounterId(1), at).await.is_ok());

        assert_eq!(stats_key(SpeciesId(16)), "scanwatch:stats:16");
        assert_eq!(seen_key(SpeciesId(16)), "scanwatch:seen:16");
        let records = ledger.records().await.unwrap_or_default();
        assert_eq!(
            records,
            vec![SightingRecord {
                species_id: SpeciesId(16),
                encounter_count: 1,
                last_seen: Some(at),
            }]
        );
        assert_eq!(store.hash_len("stats:16").await.ok(), Some(1));
    }

    #[test]
    fn species_suffix_parsing() {
        assert_eq!(parse_species_suffix("scanwatch:stats:25"), Some(SpeciesId(25)));
        assert_eq!(parse_species_suffix("scanwatch:stats:pika"), None);
        assert_eq!(parse_species_suffix("scanwatch:seen:25"), None);
    }
}
