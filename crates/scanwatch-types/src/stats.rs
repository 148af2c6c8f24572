//! Derived sighting statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::SpeciesId;

/// Sighting summary for one species.
///
/// Recomputed on every query from what is currently stored; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SightingStat {
    /// Species this record describes.
    pub species_id: SpeciesId,
    /// Display name from the species lookup.
    pub species_name: String,
    /// Number of distinct encounters recorded for the species.
    pub count: u64,
    /// Most recent sighting, absent if the species was never seen.
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    #[ts(type = "number | null")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl SightingStat {
    /// A record for a species with no recorded sightings.
    pub const fn unseen(species_id: SpeciesId, species_name: String) -> Self {
        Self {
            species_id,
            species_name,
            count: 0,
            last_seen: None,
        }
    }
}
