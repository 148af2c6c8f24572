//! Namespaced JSON storage for scan entities.
//!
//! One [`EntityStore`] per entity kind. Records live at `{namespace}:{id}`:
//!
//! | Kind | Namespace | TTL |
//! |------|-----------|-----|
//! | [`Creature`] | `creatures` | until `disappear_time` |
//! | [`PointOfInterest`] | `points` | none |
//! | [`Landmark`] | `landmarks` | none |

use std::marker::PhantomData;

use chrono::Utc;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use scanwatch_types::{Creature, EncounterId, Landmark, PointOfInterest, SpeciesId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DbError;
use crate::sightings::SightingLedger;
use crate::store::StoreHandle;

/// An entity kind that can be kept in an [`EntityStore`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key namespace for this kind.
    const NAMESPACE: &'static str;

    /// Natural identifier used as the key suffix.
    fn store_id(&self) -> String;

    /// Species and encounter to record as a sighting when stored.
    fn sighting(&self) -> Option<(SpeciesId, EncounterId)> {
        None
    }
}

impl Entity for Creature {
    const NAMESPACE: &'static str = "creatures";

    fn store_id(&self) -> String {
        self.encounter_id.encode()
    }

    fn sighting(&self) -> Option<(SpeciesId, EncounterId)> {
        Some((self.species_id, self.encounter_id))
    }
}

impl Entity for PointOfInterest {
    const NAMESPACE: &'static str = "points";

    fn store_id(&self) -> String {
        self.id.clone()
    }
}

impl Entity for Landmark {
    const NAMESPACE: &'static str = "landmarks";

    fn store_id(&self) -> String {
        self.id.clone()
    }
}

/// Typed view over one key namespace of the store.
pub struct EntityStore<T> {
    store: StoreHandle,
    sightings: SightingLedger,
    _kind: PhantomData<fn() -> T>,
}

/// Store of live creatures.
pub type CreatureStore = EntityStore<Creature>;
/// Store of points of interest.
pub type PointStore = EntityStore<PointOfInterest>;
/// Store of landmarks.
pub type LandmarkStore = EntityStore<Landmark>;

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            sightings: self.sightings.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    /// Create a store for `T` over `store`.
    pub fn new(store: StoreHandle) -> Self {
        Self {
            sightings: SightingLedger::new(store.clone()),
            store,
            _kind: PhantomData,
        }
    }

    /// Full key of the record with `id`.
    pub fn key(id: &str) -> String {
        format!("{}:{id}", T::NAMESPACE)
    }

    /// Upsert `value` under `id`.
    ///
    /// With `ttl_seconds` the record is removed by the store that many
    /// seconds from now; the countdown restarts on every call. Without it
    /// the record stays until overwritten. Creatures additionally record a
    /// sighting for their species.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if `value` cannot be encoded.
    /// Returns [`DbError::StorageUnavailable`] if any write fails.
    pub async fn set(
        &self,
        id: &str,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        self.store.set_value(&Self::key(id), &json, ttl_seconds).await?;

        if let Some((species, encounter)) = value.sighting() {
            self.sightings.record(species, encounter, Utc::now()).await?;
        }
        Ok(())
    }

    /// Upsert `value` under its own [`Entity::store_id`].
    ///
    /// # Errors
    ///
    /// Same as [`EntityStore::set`].
    pub async fn put(&self, value: &T, ttl_seconds: Option<u64>) -> Result<(), DbError> {
        self.set(&value.store_id(), value, ttl_seconds).await
    }

    /// Read the live record under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the read fails, or
    /// [`DbError::Serialization`] if the stored JSON does not decode.
    pub async fn get(&self, id: &str) -> Result<Option<T>, DbError> {
        self.store
            .get_value(&Self::key(id))
            .await?
            .map(|json| serde_json::from_str(&json).map_err(DbError::from))
            .transpose()
    }

    /// Lazily stream every live record in the namespace.
    ///
    /// Each call rescans the store; see [`StoreHandle::scan_values`].
    pub fn get_all(&self) -> BoxStream<'static, Result<T, DbError>> {
        self.store
            .scan_values(&format!("{}:", T::NAMESPACE))
            .and_then(|json| async move {
                serde_json::from_str::<T>(&json).map_err(DbError::from)
            })
            .boxed()
    }
}
