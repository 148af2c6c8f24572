//! Line-oriented ingestion loop.
//!
//! Each input line holds one scan payload as JSON. Blank lines are ignored.
//! A line that fails to parse or ingest is logged and dropped; the loop only
//! stops on EOF or an I/O error from the reader.

use scanwatch_core::{IngestError, Ingestor};
use scanwatch_types::SightingStat;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info, warn};

/// Running totals over one input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Scans ingested successfully.
    pub scans: usize,
    /// Lines rejected as invalid JSON or unparseable scans.
    pub rejected: usize,
    /// Scans aborted by a storage failure.
    pub failed: usize,
    /// Scans flagged as rate-limited.
    pub rate_limited: usize,
    /// Creatures written.
    pub creatures: usize,
    /// Points of interest written.
    pub points: usize,
    /// Landmarks written.
    pub landmarks: usize,
    /// Malformed records skipped inside accepted scans.
    pub skipped_records: usize,
}

/// Ingest every line of `reader` until EOF.
///
/// # Errors
///
/// Returns the reader's I/O error, if any. Per-scan failures are logged and
/// counted instead.
pub async fn ingest_lines<R>(reader: R, ingestor: &Ingestor) -> std::io::Result<RunTotals>
where
    R: AsyncBufRead + Unpin,
{
    let mut totals = RunTotals::default();
    let mut lines = reader.lines();
    let mut line_no: usize = 0;

    while let Some(line) = lines.next_line().await? {
        line_no = line_no.saturating_add(1);
        if line.trim().is_empty() {
            continue;
        }

        let raw: Value = match serde_json::from_str(&line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping line that is not JSON");
                totals.rejected = totals.rejected.saturating_add(1);
                continue;
            }
        };

        match ingestor.ingest(&raw).await {
            Ok(report) => {
                debug!(line = line_no, ?report, "scan ingested");
                totals.scans = totals.scans.saturating_add(1);
                totals.creatures = totals.creatures.saturating_add(report.persisted.creatures);
                totals.points = totals.points.saturating_add(report.persisted.points);
                totals.landmarks = totals.landmarks.saturating_add(report.persisted.landmarks);
                totals.skipped_records = totals.skipped_records.saturating_add(report.skipped);
                if report.rate_limited {
                    totals.rate_limited = totals.rate_limited.saturating_add(1);
                }
            }
            Err(IngestError::Scan(e)) => {
                warn!(line = line_no, error = %e, "scan rejected");
                totals.rejected = totals.rejected.saturating_add(1);
            }
            Err(IngestError::Storage(e)) => {
                error!(line = line_no, error = %e, "scan aborted by storage failure");
                totals.failed = totals.failed.saturating_add(1);
            }
        }
    }

    Ok(totals)
}

/// Log the most sighted species, at most `limit` of them.
pub fn log_top_species(stats: &[SightingStat], limit: usize) {
    for (rank, stat) in stats
        .iter()
        .take_while(|s| s.count > 0)
        .take(limit)
        .enumerate()
    {
        info!(
            rank = rank.saturating_add(1),
            species_id = %stat.species_id,
            species = %stat.species_name,
            count = stat.count,
            last_seen = ?stat.last_seen,
            "top species"
        );
    }
}
