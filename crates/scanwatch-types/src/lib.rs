//! Shared type definitions for scanwatch.
//!
//! Entities in this crate flow to the web layer as JSON and, through `ts-rs`,
//! as `TypeScript` bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Species and encounter identifiers (lossless encounter encoding)
//! - [`entities`] -- Normalized creatures, points of interest, landmarks
//! - [`stats`] -- Derived per-species sighting statistics
//! - [`raw`] -- Raw scan payload shapes from the game API

pub mod entities;
pub mod ids;
pub mod raw;
pub mod stats;

pub use entities::{ActiveCreature, Creature, Landmark, PointOfInterest, Team};
pub use ids::{EncounterId, IdError, SpeciesId};
pub use raw::{RawCell, RawCreatureData, RawFort, RawLureInfo, RawSighting};
pub use stats::SightingStat;
