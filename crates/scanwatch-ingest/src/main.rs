//! Scan ingestion entry point for scanwatch.
//!
//! Reads newline-delimited scan payloads from stdin, ingests each into the
//! configured store, and logs a sighting summary at EOF.
//!
//! # Architecture
//!
//! ```text
//! stdin (NDJSON) --> Ingestor --> StoreHandle (Dragonfly | memory)
//!                                       |
//!                     EOF --> ActiveCreatures, StatsAggregator --> log
//! ```

mod pipeline;

use anyhow::Context;
use scanwatch_core::config::LoggingConfig;
use scanwatch_core::{
    ActiveCreatures, ExpiryPolicy, Ingestor, ScanParser, ScanwatchConfig, SpeciesTable,
    StatsAggregator, StoreBackend,
};
use scanwatch_db::{SightingLedger, StoreHandle};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Number of species listed in the closing summary.
const TOP_SPECIES: usize = 10;

/// Application entry point.
///
/// Loads configuration, initializes logging, connects to the store, and
/// ingests stdin until EOF.
///
/// # Errors
///
/// Returns an error if configuration, the store connection, the species
/// table, or reading stdin fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ScanwatchConfig::load().context("loading configuration")?;
    init_tracing(&config.logging);

    info!(
        backend = ?config.store.backend,
        species_count = config.species.count,
        max_hidden_ms = config.expiry.max_hidden_ms,
        fallback_lifetime_secs = config.expiry.fallback_lifetime_secs,
        "scanwatch-ingest starting"
    );

    let store = match config.store.backend {
        StoreBackend::Dragonfly => StoreHandle::dragonfly(&config.store.dragonfly_url)
            .await
            .with_context(|| format!("connecting to {}", config.store.dragonfly_url))?,
        StoreBackend::Memory => StoreHandle::memory(),
    };
    info!(backend = store.name(), "store ready");

    let names = match &config.species.names_path {
        Some(path) => SpeciesTable::from_file(path)
            .with_context(|| format!("loading species table {}", path.display()))?,
        None => SpeciesTable::new(),
    };

    let parser = ScanParser::new(ExpiryPolicy::from_config(&config.expiry));
    let ingestor = Ingestor::new(&store, parser);

    let totals = pipeline::ingest_lines(BufReader::new(tokio::io::stdin()), &ingestor)
        .await
        .context("reading stdin")?;
    info!(
        scans = totals.scans,
        rejected = totals.rejected,
        failed = totals.failed,
        rate_limited = totals.rate_limited,
        creatures = totals.creatures,
        points = totals.points,
        landmarks = totals.landmarks,
        skipped_records = totals.skipped_records,
        "input exhausted"
    );

    let active = ActiveCreatures::new(store.clone(), names.clone())
        .get_active()
        .await
        .context("listing active creatures")?;
    info!(active_creatures = active.len(), "creatures still visible");
    if let Some(next) = active.first() {
        info!(
            species = %next.species_name,
            encounter_id = %next.creature.encounter_id,
            disappear_time = %next.creature.disappear_time,
            "next creature to disappear"
        );
    }

    let aggregator = StatsAggregator::new(SightingLedger::new(store), names, config.species.count);
    let stats = aggregator.get_stats().await.context("computing sighting stats")?;
    let seen = stats.iter().filter(|s| s.count > 0).count();
    info!(species_seen = seen, species_total = stats.len(), "sighting summary");
    pipeline::log_top_species(&stats, TOP_SPECIES);

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
