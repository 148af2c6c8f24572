//! Normalized entities produced from a scan.
//!
//! These are the values written to the store. Creatures carry a deadline and
//! expire on their own; points of interest and landmarks live until the next
//! scan overwrites them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{EncounterId, SpeciesId};

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

/// A transient creature sighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Creature {
    /// Encounter identifier, serialized in its base64 form.
    #[ts(type = "string")]
    pub encounter_id: EncounterId,
    /// Spawn point the creature appeared at.
    pub spawn_point_id: String,
    /// Species of the creature.
    pub species_id: SpeciesId,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Remaining visibility in seconds, as used for the store TTL.
    pub time_till_hidden_seconds: u64,
    /// When the creature stops being visible (epoch milliseconds on the wire).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub disappear_time: DateTime<Utc>,
}

/// A live creature as presented to map clients: the stored record plus the
/// display name of its species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveCreature {
    /// The stored creature, flattened into the same JSON object.
    #[serde(flatten)]
    pub creature: Creature,
    /// Display name of `creature.species_id`.
    pub species_name: String,
}

// ---------------------------------------------------------------------------
// PointOfInterest
// ---------------------------------------------------------------------------

/// A fixed point of interest (fort of type 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PointOfInterest {
    /// Fort identifier.
    pub id: String,
    /// Whether the point is currently usable.
    pub enabled: bool,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Last server-side modification, epoch milliseconds.
    pub last_modified: i64,
    /// Lure expiry in epoch milliseconds, present only while lured.
    pub lure_expiration: Option<i64>,
    /// Species attracted by the active lure, present only while lured.
    pub active_species_id: Option<SpeciesId>,
}

impl PointOfInterest {
    /// Whether the point currently carries lure state.
    pub const fn is_lured(&self) -> bool {
        self.lure_expiration.is_some()
    }
}

// ---------------------------------------------------------------------------
// Landmark
// ---------------------------------------------------------------------------

/// Team controlling a landmark.
///
/// Serialized as its numeric id (0 through 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Team {
    /// Nobody holds the landmark.
    #[default]
    Uncontested,
    /// Team Mystic.
    Mystic,
    /// Team Valor.
    Valor,
    /// Team Instinct.
    Instinct,
}

impl Team {
    /// Numeric id used by the game API.
    pub const fn id(self) -> u8 {
        match self {
            Self::Uncontested => 0,
            Self::Mystic => 1,
            Self::Valor => 2,
            Self::Instinct => 3,
        }
    }
}

impl TryFrom<u8> for Team {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::Uncontested),
            1 => Ok(Self::Mystic),
            2 => Ok(Self::Valor),
            3 => Ok(Self::Instinct),
            other => Err(format!("unknown team id: {other}")),
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        team.id()
    }
}

/// A contested landmark (any fort whose type is not 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Landmark {
    /// Fort identifier.
    pub id: String,
    /// Controlling team.
    #[ts(type = "number")]
    pub team: Team,
    /// Species guarding the landmark, if any.
    pub guard_species_id: Option<SpeciesId>,
    /// Prestige points, 0 when not reported.
    pub points: i64,
    /// Whether the landmark is currently usable.
    pub enabled: bool,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Last server-side modification, epoch milliseconds.
    pub last_modified: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_serializes_as_number() {
        let json = serde_json::to_string(&Team::Valor).unwrap_or_default();
        assert_eq!(json, "2");
        let back: Result<Team, _> = serde_json::from_str("3");
        assert_eq!(back.ok(), Some(Team::Instinct));
    }

    #[test]
    fn team_rejects_unknown_id() {
        let back: Result<Team, _> = serde_json::from_str("7");
        assert!(back.is_err());
        assert!(Team::try_from(4).is_err());
    }

    #[test]
    fn creature_wire_format() {
        let creature = Creature {
            encounter_id: EncounterId(12345),
            spawn_point_id: "89c2".to_owned(),
            species_id: SpeciesId(16),
            latitude: 40.0,
            longitude: -73.0,
            time_till_hidden_seconds: 60,
            disappear_time: DateTime::from_timestamp_millis(1_469_000_060_000)
                .unwrap_or_default(),
        };
        let value = serde_json::to_value(&creature).unwrap_or_default();
        assert_eq!(value["encounter_id"], "MTIzNDU=");
        assert_eq!(value["species_id"], 16);
        assert_eq!(value["disappear_time"], 1_469_000_060_000_i64);

        let back: Result<Creature, _> = serde_json::from_value(value);
        assert_eq!(back.ok(), Some(creature));
    }

    #[test]
    fn active_creature_is_one_flat_object() {
        let active = ActiveCreature {
            creature: Creature {
                encounter_id: EncounterId(7),
                spawn_point_id: "89c2".to_owned(),
                species_id: SpeciesId(25),
                latitude: 1.0,
                longitude: 2.0,
                time_till_hidden_seconds: 60,
                disappear_time: DateTime::from_timestamp_millis(1_000).unwrap_or_default(),
            },
            species_name: "Pikachu".to_owned(),
        };
        let value = serde_json::to_value(&active).unwrap_or_default();
        assert_eq!(value.get("species_name"), Some(&serde_json::json!("Pikachu")));
        assert_eq!(value.get("species_id"), Some(&serde_json::json!(25)));
        assert!(value.get("creature").is_none());
    }

    #[test]
    fn lure_state_reports_lured() {
        let mut point = PointOfInterest {
            id: "stop".to_owned(),
            enabled: true,
            latitude: 0.0,
            longitude: 0.0,
            last_modified: 0,
            lure_expiration: None,
            active_species_id: None,
        };
        assert!(!point.is_lured());
        point.lure_expiration = Some(1);
        assert!(point.is_lured());
    }
}
