//! Scan payload normalization.
//!
//! Turns one raw scan response into three id-keyed maps of entities. The
//! parser is pure: it never touches the store (see [`crate::ingest`]).
//!
//! Identifiers can repeat within one scan (neighbouring cells, or a creature
//! listed as both wild and catchable). The first occurrence wins and later
//! ones are dropped without a warning. Forts share one id namespace across
//! points of interest and landmarks.
//!
//! Records that fail to decode are skipped individually; the rest of the
//! batch is still parsed.

use std::collections::{BTreeMap, BTreeSet};

use scanwatch_types::raw::MAP_CELLS_POINTER;
use scanwatch_types::{
    Creature, EncounterId, Landmark, PointOfInterest, RawCell, RawFort, RawSighting, SpeciesId,
    Team,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::expiry::ExpiryPolicy;

/// Errors raised while parsing a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The payload has no `responses.GET_MAP_OBJECTS.map_cells` list.
    #[error("scan payload has no responses.GET_MAP_OBJECTS.map_cells list")]
    MissingMapCells,

    /// A single record could not be decoded. Reported per record, never
    /// returned from [`ScanParser::parse`].
    #[error("malformed {kind}: {reason}")]
    MalformedRecord {
        /// Which kind of record failed.
        kind: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ScanError {
    fn malformed(kind: &'static str, reason: impl ToString) -> Self {
        Self::MalformedRecord {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// The normalized content of one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedScan {
    /// Creatures by encounter id.
    pub creatures: BTreeMap<EncounterId, Creature>,
    /// Points of interest by fort id.
    pub points: BTreeMap<String, PointOfInterest>,
    /// Landmarks by fort id.
    pub landmarks: BTreeMap<String, Landmark>,
    /// No cell carried any sighting or fort list; upstream is likely
    /// rate-limiting.
    pub rate_limited: bool,
    /// Cells and records rejected as malformed.
    pub skipped: usize,
}

impl ParsedScan {
    /// Total number of entities across the three maps.
    pub fn entity_count(&self) -> usize {
        self.creatures
            .len()
            .saturating_add(self.points.len())
            .saturating_add(self.landmarks.len())
    }

    /// Whether the scan produced no entities.
    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }
}

/// Which creature list a sighting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SightingList {
    Wild,
    Catchable,
}

/// Normalizes raw scan payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanParser {
    expiry: ExpiryPolicy,
}

impl ScanParser {
    /// Create a parser using `expiry` for creature deadlines.
    pub const fn new(expiry: ExpiryPolicy) -> Self {
        Self { expiry }
    }

    /// Parse one scan response.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::MissingMapCells`] if the payload lacks the cell
    /// list. Malformed cells and records are skipped, not returned.
    pub fn parse(&self, raw: &Value) -> Result<ParsedScan, ScanError> {
        let cells = raw
            .pointer(MAP_CELLS_POINTER)
            .and_then(Value::as_array)
            .ok_or(ScanError::MissingMapCells)?;

        let mut scan = ParsedScan::default();
        let mut fort_ids = BTreeSet::new();
        let mut any_data = false;

        for cell in cells {
            let cell = match RawCell::deserialize(cell) {
                Ok(cell) => cell,
                Err(e) => {
                    reject(&mut scan, &ScanError::malformed("cell", e));
                    continue;
                }
            };
            any_data |= cell.has_data();

            for record in cell.wild_pokemons.iter().flatten() {
                self.add_sighting(&mut scan, record, SightingList::Wild);
            }
            for record in cell.catchable_pokemons.iter().flatten() {
                self.add_sighting(&mut scan, record, SightingList::Catchable);
            }
            for record in cell.forts.iter().flatten() {
                add_fort(&mut scan, &mut fort_ids, record);
            }
        }

        if !any_data {
            scan.rate_limited = true;
            warn!(
                cells = cells.len(),
                "Received valid response but without any data. Possibly rate-limited?"
            );
        }

        info!(
            creatures = scan.creatures.len(),
            points = scan.points.len(),
            landmarks = scan.landmarks.len(),
            skipped = scan.skipped,
            "scan parsed"
        );
        Ok(scan)
    }

    fn add_sighting(&self, scan: &mut ParsedScan, record: &Value, list: SightingList) {
        if let Some(id) = record.get("encounter_id").and_then(Value::as_u64)
            && scan.creatures.contains_key(&EncounterId(id))
        {
            return;
        }

        match self.build_creature(record) {
            Ok(creature) => {
                if list == SightingList::Catchable {
                    warn!(
                        encounter_id = %creature.encounter_id,
                        species_id = %creature.species_id,
                        "found catchable creature not in wild list"
                    );
                }
                scan.creatures.insert(creature.encounter_id, creature);
            }
            Err(e) => reject(scan, &e),
        }
    }

    fn build_creature(&self, record: &Value) -> Result<Creature, ScanError> {
        let raw =
            RawSighting::deserialize(record).map_err(|e| ScanError::malformed("sighting", e))?;
        let expiry = self
            .expiry
            .compute(raw.time_till_hidden_ms, raw.last_modified_timestamp_ms)
            .ok_or_else(|| {
                ScanError::malformed(
                    "sighting",
                    format!(
                        "timestamp out of range: last_modified={} time_till_hidden={}",
                        raw.last_modified_timestamp_ms, raw.time_till_hidden_ms
                    ),
                )
            })?;

        if expiry.used_fallback {
            debug!(
                encounter_id = raw.encounter_id,
                time_till_hidden_ms = raw.time_till_hidden_ms,
                "implausible time_till_hidden, using fallback lifetime"
            );
        }

        Ok(Creature {
            encounter_id: EncounterId(raw.encounter_id),
            spawn_point_id: raw.spawn_point_id,
            species_id: SpeciesId(raw.pokemon_data.pokemon_id),
            latitude: raw.latitude,
            longitude: raw.longitude,
            time_till_hidden_seconds: expiry.ttl_seconds,
            disappear_time: expiry.disappear_time,
        })
    }
}

fn add_fort(scan: &mut ParsedScan, fort_ids: &mut BTreeSet<String>, record: &Value) {
    if let Some(id) = record.get("id").and_then(Value::as_str)
        && fort_ids.contains(id)
    {
        return;
    }

    let fort = match RawFort::deserialize(record) {
        Ok(fort) => fort,
        Err(e) => {
            reject(scan, &ScanError::malformed("fort", e));
            return;
        }
    };

    if fort.is_point_of_interest() {
        let point = build_point(fort);
        fort_ids.insert(point.id.clone());
        scan.points.insert(point.id.clone(), point);
    } else {
        match build_landmark(fort) {
            Ok(landmark) => {
                fort_ids.insert(landmark.id.clone());
                scan.landmarks.insert(landmark.id.clone(), landmark);
            }
            Err(e) => reject(scan, &e),
        }
    }
}

fn build_point(fort: RawFort) -> PointOfInterest {
    let (lure_expiration, active_species_id) = fort.lure_info.map_or((None, None), |lure| {
        (
            Some(lure.lure_expires_timestamp_ms),
            Some(SpeciesId(lure.active_pokemon_id)),
        )
    });

    PointOfInterest {
        id: fort.id,
        enabled: fort.enabled,
        latitude: fort.latitude,
        longitude: fort.longitude,
        last_modified: fort.last_modified_timestamp_ms,
        lure_expiration,
        active_species_id,
    }
}

fn build_landmark(fort: RawFort) -> Result<Landmark, ScanError> {
    let team = Team::try_from(fort.owned_by_team.unwrap_or(0))
        .map_err(|e| ScanError::malformed("fort", format!("{}: {e}", fort.id)))?;

    Ok(Landmark {
        id: fort.id,
        team,
        guard_species_id: fort.guard_pokemon_id.map(SpeciesId),
        points: fort.gym_points.unwrap_or(0),
        enabled: fort.enabled,
        latitude: fort.latitude,
        longitude: fort.longitude,
        last_modified: fort.last_modified_timestamp_ms,
    })
}

fn reject(scan: &mut ParsedScan, error: &ScanError) {
    scan.skipped = scan.skipped.saturating_add(1);
    warn!(error = %error, "skipping record");
}
