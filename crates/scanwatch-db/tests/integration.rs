//! Integration tests for the `scanwatch-db` storage layer.
//!
//! These tests require a live `Dragonfly` (or Redis) instance. Run with:
//!
//! ```bash
//! docker run -d -p 6379:6379 docker.dragonflydb.io/dragonflydb/dragonfly
//! cargo test -p scanwatch-db -- --ignored
//! ```
//!
//! Tests that talk to the server are marked `#[ignore]` so they are skipped
//! during normal `cargo test` runs. Each of them flushes the instance first.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use scanwatch_db::{
    CreatureStore, DbError, LandmarkStore, PointStore, SightingLedger, StoreHandle,
};
use scanwatch_types::{Creature, EncounterId, Landmark, PointOfInterest, SpeciesId, Team};

/// Dragonfly connection URL for the local Docker instance.
const DRAGONFLY_URL: &str = "redis://localhost:6379";

async fn setup() -> StoreHandle {
    let store = StoreHandle::dragonfly(DRAGONFLY_URL)
        .await
        .expect("Failed to connect to Dragonfly -- is Docker running?");
    store.flush_all().await.expect("Failed to flush");
    store
}

fn creature(encounter: u64, species: u32) -> Creature {
    Creature {
        encounter_id: EncounterId(encounter),
        spawn_point_id: "89c25a".to_owned(),
        species_id: SpeciesId(species),
        latitude: 40.0,
        longitude: -73.0,
        time_till_hidden_seconds: 1,
        disappear_time: Utc::now(),
    }
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_creature_expires() {
    let store = setup().await;
    let creatures = CreatureStore::new(store.clone());

    // Above 2^53: must survive the textual encoding.
    let c = creature(9_007_199_254_740_993, 16);
    creatures.put(&c, Some(1)).await.expect("Failed to store creature");

    let live: Vec<Creature> = creatures.get_all().try_collect().await.unwrap();
    assert_eq!(live, vec![c.clone()]);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let live: Vec<Creature> = creatures.get_all().try_collect().await.unwrap();
    assert!(live.is_empty(), "creature should have expired");

    // The sighting survives the creature.
    let records = SightingLedger::new(store.clone()).records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].species_id, SpeciesId(16));
    assert_eq!(records[0].encounter_count, 1);
    assert!(records[0].last_seen.is_some());

    store.flush_all().await.expect("Failed to flush");
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_forts_persist_and_overwrite() {
    let store = setup().await;
    let points = PointStore::new(store.clone());
    let landmarks = LandmarkStore::new(store.clone());

    let point = PointOfInterest {
        id: "stop-1".to_owned(),
        enabled: true,
        latitude: 1.0,
        longitude: 2.0,
        last_modified: 1_469_000_000_000,
        lure_expiration: None,
        active_species_id: None,
    };
    points.put(&point, None).await.unwrap();

    let mut landmark = Landmark {
        id: "gym-1".to_owned(),
        team: Team::Mystic,
        guard_species_id: Some(SpeciesId(131)),
        points: 2000,
        enabled: true,
        latitude: 1.0,
        longitude: 2.0,
        last_modified: 1_469_000_000_000,
    };
    landmarks.put(&landmark, None).await.unwrap();
    landmark.team = Team::Instinct;
    landmarks.put(&landmark, None).await.unwrap();

    assert_eq!(points.get("stop-1").await.unwrap(), Some(point));
    let all: Vec<Landmark> = landmarks.get_all().try_collect().await.unwrap();
    assert_eq!(all, vec![landmark]);

    store.flush_all().await.expect("Failed to flush");
}

#[tokio::test]
#[ignore = "requires live Dragonfly instance"]
async fn dragonfly_sighting_ledger_roundtrip() {
    let store = setup().await;
    let ledger = SightingLedger::new(store.clone());
    let at = DateTime::from_timestamp_millis(1_469_000_000_000).unwrap();

    for id in [1_u64, 2, 2, 3] {
        ledger.record(SpeciesId(25), EncounterId(id), at).await.unwrap();
    }

    let records = ledger.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].encounter_count, 3);
    assert_eq!(records[0].last_seen, Some(at));

    store.flush_all().await.expect("Failed to flush");
}

#[tokio::test]
async fn dragonfly_invalid_url_is_config_error() {
    let result = StoreHandle::dragonfly("not a url").await;
    assert!(matches!(result, Err(DbError::Config(_))));
}
