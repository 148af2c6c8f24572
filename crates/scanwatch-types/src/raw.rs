//! Raw scan payload shapes, as delivered by the game API.
//!
//! Field names follow the upstream wire format. Only the per-record shapes are
//! typed; cells and record lists stay as [`serde_json::Value`] so that one bad
//! record can be rejected without failing the whole scan.
//!
//! ```text
//! responses
//!   +-- GET_MAP_OBJECTS
//!         +-- map_cells[]
//!               |-- wild_pokemons[]      (RawSighting)
//!               |-- catchable_pokemons[] (RawSighting)
//!               +-- forts[]              (RawFort)
//! ```

use serde::Deserialize;
use serde_json::Value;

/// JSON pointer to the cell list inside a scan response.
pub const MAP_CELLS_POINTER: &str = "/responses/GET_MAP_OBJECTS/map_cells";

/// Fort `type` value marking a point of interest.
pub const POINT_OF_INTEREST_FORT_TYPE: i64 = 1;

const POINT_OF_INTEREST_FORT_TYPE_F64: f64 = 1.0;

/// One map cell. Every list is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCell {
    /// Creatures visible on the map.
    #[serde(default)]
    pub wild_pokemons: Option<Vec<Value>>,
    /// Creatures close enough to interact with.
    #[serde(default)]
    pub catchable_pokemons: Option<Vec<Value>>,
    /// Points of interest and landmarks.
    #[serde(default)]
    pub forts: Option<Vec<Value>>,
}

impl RawCell {
    /// Whether the cell carries any sighting or fort list at all.
    pub const fn has_data(&self) -> bool {
        self.wild_pokemons.is_some() || self.catchable_pokemons.is_some() || self.forts.is_some()
    }
}

/// Nested creature data of a sighting.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCreatureData {
    /// Species id.
    pub pokemon_id: u32,
}

/// A creature sighting from either sighting list.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSighting {
    /// Encounter identifier.
    pub encounter_id: u64,
    /// Spawn point identifier.
    pub spawn_point_id: String,
    /// Creature details.
    pub pokemon_data: RawCreatureData,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Server-reported remaining visibility, may be negative or absurd.
    pub time_till_hidden_ms: i64,
    /// Server-side timestamp of the sighting.
    pub last_modified_timestamp_ms: i64,
}

/// Lure sub-state of a point of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLureInfo {
    /// Lure expiry, epoch milliseconds.
    pub lure_expires_timestamp_ms: i64,
    /// Species attracted by the lure.
    pub active_pokemon_id: u32,
}

/// A fort: a point of interest when `type == 1`, a landmark otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFort {
    /// Fort identifier, shared namespace for both kinds.
    pub id: String,
    /// Fort kind discriminator. Kept untyped: only "equals 1" matters.
    #[serde(default, rename = "type")]
    pub fort_type: Option<Value>,
    /// Whether the fort is usable.
    pub enabled: bool,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Server-side modification timestamp.
    pub last_modified_timestamp_ms: i64,
    /// Lure state, points of interest only.
    #[serde(default)]
    pub lure_info: Option<RawLureInfo>,
    /// Controlling team id, landmarks only.
    #[serde(default)]
    pub owned_by_team: Option<u8>,
    /// Guarding species, landmarks only.
    #[serde(default)]
    pub guard_pokemon_id: Option<u32>,
    /// Prestige points, landmarks only.
    #[serde(default)]
    pub gym_points: Option<i64>,
}

impl RawFort {
    /// Whether this fort describes a point of interest.
    ///
    /// A numeric `type` equal to 1 (`1` or `1.0`) marks a point of interest.
    /// Any other value, including a missing or non-numeric one, marks a
    /// landmark.
    #[allow(clippy::float_cmp)]
    pub fn is_point_of_interest(&self) -> bool {
        self.fort_type.as_ref().is_some_and(|value| {
            value.as_i64() == Some(POINT_OF_INTEREST_FORT_TYPE)
                || value.as_f64() == Some(POINT_OF_INTEREST_FORT_TYPE_F64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_without_lists_has_no_data() {
        let cell: RawCell = serde_json::from_value(serde_json::json!({
            "s2_cell_id": 1,
            "current_timestamp_ms": 2
        }))
        .unwrap_or_default();
        assert!(!cell.has_data());
    }

    #[test]
    fn empty_list_still_counts_as_data() {
        let cell: RawCell =
            serde_json::from_value(serde_json::json!({ "forts": [] })).unwrap_or_default();
        assert!(cell.has_data());
    }

    #[test]
    fn fort_type_discriminates() {
        let fort: Result<RawFort, _> = serde_json::from_value(serde_json::json!({
            "id": "a",
            "type": 1,
            "enabled": true,
            "latitude": 1.0,
            "longitude": 2.0,
            "last_modified_timestamp_ms": 3
        }));
        assert!(fort.is_ok_and(|f| f.is_point_of_interest()));

        let untyped: Result<RawFort, _> = serde_json::from_value(serde_json::json!({
            "id": "b",
            "enabled": true,
            "latitude": 1.0,
            "longitude": 2.0,
            "last_modified_timestamp_ms": 3
        }));
        assert!(untyped.is_ok_and(|f| !f.is_point_of_interest()));
    }

    #[test]
    fn fort_type_accepts_any_json_value() {
        let classify = |fort_type: Value| {
            let fort: Result<RawFort, _> = serde_json::from_value(serde_json::json!({
                "id": "a",
                "type": fort_type,
                "enabled": true,
                "latitude": 1.0,
                "longitude": 2.0,
                "last_modified_timestamp_ms": 3
            }));
            fort.map(|f| f.is_point_of_interest()).ok()
        };

        assert_eq!(classify(serde_json::json!(1.0)), Some(true));
        assert_eq!(classify(serde_json::json!(1.5)), Some(false));
        assert_eq!(classify(serde_json::json!(0)), Some(false));
        assert_eq!(classify(serde_json::json!("GYM")), Some(false));
        assert_eq!(classify(serde_json::json!("1")), Some(false));
        assert_eq!(classify(Value::Null), Some(false));
    }
}
