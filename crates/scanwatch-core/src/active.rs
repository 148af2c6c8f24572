//! Live creature listing for map clients.

use futures::TryStreamExt;
use scanwatch_db::{CreatureStore, DbError, StoreHandle};
use scanwatch_types::ActiveCreature;

use crate::species::SpeciesNames;

/// Reads the creatures still visible and attaches their species names.
///
/// Expired creatures are never returned: the store drops them on its own
/// clock before they can be listed.
pub struct ActiveCreatures<N> {
    creatures: CreatureStore,
    names: N,
}

impl<N: SpeciesNames> ActiveCreatures<N> {
    /// Create a reader over `store`.
    pub fn new(store: StoreHandle, names: N) -> Self {
        Self {
            creatures: CreatureStore::new(store),
            names,
        }
    }

    /// Every live creature with its species name, soonest to disappear
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the store cannot be read,
    /// or [`DbError::Serialization`] if a stored record does not decode.
    pub async fn get_active(&self) -> Result<Vec<ActiveCreature>, DbError> {
        let mut active: Vec<ActiveCreature> = self
            .creatures
            .get_all()
            .map_ok(|creature| ActiveCreature {
                species_name: self.names.name_for(creature.species_id),
                creature,
            })
            .try_collect()
            .await?;

        active.sort_by(|a, b| {
            a.creature
                .disappear_time
                .cmp(&b.creature.disappear_time)
                .then(a.creature.encounter_id.cmp(&b.creature.encounter_id))
        });
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::DateTime;
    use scanwatch_db::MemoryStore;
    use scanwatch_types::{Creature, EncounterId, SpeciesId};

    use super::*;
    use crate::species::SpeciesTable;

    fn creature(encounter: u64, species: u32, disappear_ms: i64) -> Creature {
        Creature {
            encounter_id: EncounterId(encounter),
            spawn_point_id: "sp".to_owned(),
            species_id: SpeciesId(species),
            latitude: 1.0,
            longitude: 2.0,
            time_till_hidden_seconds: 1,
            disappear_time: DateTime::from_timestamp_millis(disappear_ms).unwrap_or_default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn lists_live_creatures_with_names() {
        let store = StoreHandle::memory();
        let writer = CreatureStore::new(store.clone());
        assert!(writer.put(&creature(1, 25, 9_000), Some(60)).await.is_ok());
        assert!(writer.put(&creature(2, 999, 5_000), Some(60)).await.is_ok());
        assert!(writer.put(&creature(3, 16, 1_000), Some(1)).await.is_ok());

        tokio::time::advance(Duration::from_secs(2)).await;

        let mut table = SpeciesTable::new();
        table.insert(SpeciesId(25), "Pikachu");
        let reader = ActiveCreatures::new(store, table);

        let active = reader.get_active().await.unwrap_or_default();
        let listed: Vec<(EncounterId, &str)> = active
            .iter()
            .map(|a| (a.creature.encounter_id, a.species_name.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (EncounterId(2), "Unknown #999"),
                (EncounterId(1), "Pikachu"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let reader = ActiveCreatures::new(StoreHandle::memory(), SpeciesTable::new());
        assert_eq!(reader.get_active().await.ok(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn unavailable_store_is_reported() {
        let memory = MemoryStore::new();
        memory.set_online(false);
        let reader = ActiveCreatures::new(memory.into(), SpeciesTable::new());

        let result = reader.get_active().await;
        assert!(matches!(result, Err(DbError::StorageUnavailable(_))));
    }
}
