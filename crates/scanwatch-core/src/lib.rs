//! Scan parsing, creature expiry, ingestion, and sighting stats for scanwatch.
//!
//! This crate turns raw scan payloads into typed entities and keeps the
//! store current:
//!
//! ```text
//! raw JSON --> ScanParser --> ParsedScan --> Ingestor --> StoreHandle
//!                  |                                          |
//!              ExpiryPolicy                        StatsAggregator --> SightingStat[]
//! ```
//!
//! # Modules
//!
//! - [`active`] -- [`ActiveCreatures`], live creatures with species names.
//! - [`config`] -- Configuration loading from `scanwatch-config.yaml` into
//!   strongly-typed structs.
//! - [`expiry`] -- [`ExpiryPolicy`] for creature deadlines and TTLs.
//! - [`parser`] -- [`ScanParser`], pure normalization with deduplication.
//! - [`ingest`] -- [`Ingestor`], parse then persist.
//! - [`species`] -- [`SpeciesNames`] trait and the JSON-backed [`SpeciesTable`].
//! - [`stats`] -- [`StatsAggregator`], the per-species sighting table.

pub mod active;
pub mod config;
pub mod expiry;
pub mod ingest;
pub mod parser;
pub mod species;
pub mod stats;

pub use active::ActiveCreatures;
pub use config::{ConfigError, ScanwatchConfig, StoreBackend};
pub use expiry::{Expiry, ExpiryPolicy};
pub use ingest::{IngestError, IngestReport, Ingestor, PersistSummary};
pub use parser::{ParsedScan, ScanError, ScanParser};
pub use species::{SpeciesError, SpeciesNames, SpeciesTable, placeholder_name};
pub use stats::StatsAggregator;
