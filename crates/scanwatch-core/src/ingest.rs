//! Scan ingestion: parse a payload, then write its entities to the store.
//!
//! # Architecture
//!
//! ```text
//! raw scan (JSON)
//!   |
//!   +-- ScanParser::parse()   --> ParsedScan (pure)
//!   |
//!   +-- Ingestor::persist()
//!         +-- creatures  --> creatures:{encoded id}  EX time_till_hidden
//!         |                  scanwatch:stats:{species} / scanwatch:seen:{species}
//!         +-- points     --> points:{id}
//!         +-- landmarks  --> landmarks:{id}
//! ```
//!
//! A storage failure aborts the remaining writes of the cycle. Writes that
//! already succeeded stay in place.

use scanwatch_db::{CreatureStore, DbError, LandmarkStore, PointStore, StoreHandle};
use serde_json::Value;
use tracing::info;

use crate::parser::{ParsedScan, ScanError, ScanParser};

/// Errors that abort one ingestion cycle.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The payload could not be parsed at all.
    #[error("scan rejected: {0}")]
    Scan(#[from] ScanError),

    /// The store rejected a write.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

/// Counts of entities written by [`Ingestor::persist`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    /// Creatures written.
    pub creatures: usize,
    /// Points of interest written.
    pub points: usize,
    /// Landmarks written.
    pub landmarks: usize,
}

/// Outcome of one [`Ingestor::ingest`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// What was written.
    pub persisted: PersistSummary,
    /// Records skipped as malformed.
    pub skipped: usize,
    /// The scan looked rate-limited.
    pub rate_limited: bool,
}

/// Writes parsed scans into the three entity stores.
#[derive(Clone)]
pub struct Ingestor {
    parser: ScanParser,
    creatures: CreatureStore,
    points: PointStore,
    landmarks: LandmarkStore,
}

impl Ingestor {
    /// Create an ingestor writing through `store`.
    pub fn new(store: &StoreHandle, parser: ScanParser) -> Self {
        Self {
            parser,
            creatures: CreatureStore::new(store.clone()),
            points: PointStore::new(store.clone()),
            landmarks: LandmarkStore::new(store.clone()),
        }
    }

    /// The creature store written by this ingestor.
    pub const fn creatures(&self) -> &CreatureStore {
        &self.creatures
    }

    /// The point-of-interest store written by this ingestor.
    pub const fn points(&self) -> &PointStore {
        &self.points
    }

    /// The landmark store written by this ingestor.
    pub const fn landmarks(&self) -> &LandmarkStore {
        &self.landmarks
    }

    /// Write every entity of `scan`. Creatures expire after their
    /// `time_till_hidden_seconds`; points and landmarks do not expire.
    ///
    /// # Errors
    ///
    /// Returns the first [`DbError`] raised by the store.
    pub async fn persist(&self, scan: &ParsedScan) -> Result<PersistSummary, DbError> {
        let mut summary = PersistSummary::default();

        for creature in scan.creatures.values() {
            self.creatures
                .put(creature, Some(creature.time_till_hidden_seconds))
                .await?;
            summary.creatures = summary.creatures.saturating_add(1);
        }
        for point in scan.points.values() {
            self.points.put(point, None).await?;
            summary.points = summary.points.saturating_add(1);
        }
        for landmark in scan.landmarks.values() {
            self.landmarks.put(landmark, None).await?;
            summary.landmarks = summary.landmarks.saturating_add(1);
        }

        info!(
            creatures = summary.creatures,
            points = summary.points,
            landmarks = summary.landmarks,
            "Upserted scan entities"
        );
        Ok(summary)
    }

    /// Parse `raw` and persist the result.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Scan`] if the payload has no cell list, or
    /// [`IngestError::Storage`] if a write fails.
    pub async fn ingest(&self, raw: &Value) -> Result<IngestReport, IngestError> {
        let scan = self.parser.parse(raw)?;
        let persisted = self.persist(&scan).await?;
        Ok(IngestReport {
            persisted,
            skipped: scan.skipped,
            rate_limited: scan.rate_limited,
        })
    }
}
