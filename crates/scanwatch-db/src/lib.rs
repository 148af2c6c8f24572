//! Storage layer for scanwatch.
//!
//! Entities are kept as JSON in a key-value store. Creatures carry a TTL and
//! vanish on the store's own clock; points of interest and landmarks stay
//! until overwritten. Per-species sighting keys are maintained alongside the
//! creature writes and never expire.
//!
//! # Architecture
//!
//! ```text
//! Ingestor / StatsAggregator
//!     |
//!     +-- EntityStore<Creature|PointOfInterest|Landmark>
//!     |       +-- SightingLedger (scanwatch:stats:*, scanwatch:seen:*)
//!     |
//!     +-- StoreHandle
//!             |-- DragonflyPool (fred, Redis protocol)
//!             +-- MemoryStore   (in-process, tokio clock)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- Backend-agnostic handle (enum dispatch)
//! - [`dragonfly`] -- `Dragonfly`/Redis backend
//! - [`memory`] -- In-process backend with identical TTL semantics
//! - [`entity_store`] -- Typed, namespaced entity storage
//! - [`sightings`] -- Per-species sighting keys
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod entity_store;
pub mod error;
pub mod memory;
pub mod sightings;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyPool;
pub use entity_store::{CreatureStore, Entity, EntityStore, LandmarkStore, PointStore};
pub use error::DbError;
pub use memory::MemoryStore;
pub use sightings::{SightingLedger, SightingRecord};
pub use store::StoreHandle;
