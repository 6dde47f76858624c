//! Comparative reporting and persisted metric files
//!
//! The reporter re-exposes each trial's own time-ordered records keyed by
//! policy name. No resampling or interpolation happens here: each trial's
//! clock starts at 0 independently, series may differ in length and
//! timestamps, and consumers must handle that.

use std::path::{Path, PathBuf};

use crate::orchestrator::ComparisonSet;
use crate::trial::{MetricRecord, TrialResult};
use crate::Result;

/// Column header of the persisted per-scheduler metric files.
pub const CSV_COLUMNS: [&str; 4] = [
    "time",
    "aggregate_throughput",
    "max_latency",
    "weighted_loss_rate",
];

/// Aligns multiple trials for side-by-side consumption.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparativeReporter;

impl ComparativeReporter {
    /// Per-scheduler series in config submission order.
    ///
    /// Each entry is `(scheduler, records)` with the trial's own records
    /// untouched; an aborted trial contributes whatever partial series it
    /// collected.
    #[must_use]
    pub fn build(set: &ComparisonSet) -> Vec<(&str, &[MetricRecord])> {
        set.iter()
            .map(|(scheduler, result)| (scheduler, result.records()))
            .collect()
    }

    /// Per-scheduler terminal statuses in config submission order, so
    /// downstream rendering can annotate aborted series with their reason.
    #[must_use]
    pub fn statuses(set: &ComparisonSet) -> Vec<(&str, &TrialResult)> {
        set.iter().collect()
    }
}

/// Write one CSV file per scheduler into `dir`, named
/// `<prefix>_<scheduler>.csv`, with columns [`CSV_COLUMNS`].
///
/// A trial with zero records still produces a header-only file so no
/// attempted scheduler disappears from the output set. Returns the written
/// paths in submission order.
///
/// # Errors
///
/// Returns an error if a file cannot be created or a row cannot be written.
pub fn export_csv(set: &ComparisonSet, dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(set.len());
    for (scheduler, result) in set.iter() {
        let path = dir.join(format!("{prefix}_{scheduler}.csv"));
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(CSV_COLUMNS)?;
        for record in result.records() {
            writer.serialize(record)?;
        }
        writer.flush().map_err(crate::Error::Io)?;
        tracing::debug!(
            scheduler,
            rows = result.records().len(),
            path = %path.display(),
            "metric file written"
        );
        paths.push(path);
    }
    Ok(paths)
}
