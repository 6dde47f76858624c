//! Subflow telemetry aggregation
//!
//! Reduces one [`SubflowSnapshot`] to one [`MetricRecord`]. The sampler is a
//! pure function of its input snapshot; the relative timestamp is stamped by
//! the caller, which keeps the arithmetic referentially transparent and
//! trivially testable.
//!
//! Throughput is reported in segments per record interval. Consumers that
//! want bytes multiply by [`SEGMENT_SIZE_BYTES`]; the core never converts
//! silently.

use serde::{Deserialize, Serialize};

use crate::subflow::SubflowSnapshot;
use crate::trial::MetricRecord;

/// Segment-to-byte conversion constant (Ethernet-path TCP MSS).
///
/// Applied only by consumers that want byte units out of segment counts.
pub const SEGMENT_SIZE_BYTES: u64 = 1460;

/// Which loss definition the sampler reports.
///
/// Source measurement scripts disagreed on the loss computation; both
/// variants are kept as explicit, separately tested models rather than
/// assumed equivalent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossModel {
    /// Per-subflow `retransmits / segments_out`, averaged with weights
    /// proportional to each subflow's share of total segments. A high-volume
    /// low-loss subflow is not drowned out by a low-volume high-loss one.
    /// This is the primary model.
    #[default]
    ThroughputWeighted,
    /// `Σ retransmits / Σ segments_out` across all subflows, aggregated once
    /// outside the per-subflow loop.
    AggregateRetransmit,
}

/// Sampler configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Loss definition to report in [`MetricRecord::weighted_loss_rate`].
    pub loss_model: LossModel,
}

/// Reduces per-subflow counter snapshots to aggregate metric records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubflowSampler {
    config: SamplerConfig,
}

impl SubflowSampler {
    /// Create a sampler with the default (throughput-weighted) loss model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sampler with an explicit configuration.
    #[must_use]
    pub const fn with_config(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Get the active configuration.
    #[must_use]
    pub const fn config(&self) -> SamplerConfig {
        self.config
    }

    /// Reduce one snapshot to one metric record.
    ///
    /// `relative_time_secs` is the caller's elapsed-time bookkeeping; the
    /// sampler itself is pure in `snapshot`. An empty snapshot yields an
    /// all-zero record, never an error.
    #[must_use]
    pub fn sample(&self, relative_time_secs: f64, snapshot: &SubflowSnapshot) -> MetricRecord {
        let aggregate_throughput: f64 =
            snapshot.iter().map(|c| c.segments_out as f64).sum();
        let max_latency = snapshot
            .iter()
            .map(|c| c.rtt_us)
            .max()
            .unwrap_or(0) as f64;
        let loss = match self.config.loss_model {
            LossModel::ThroughputWeighted => weighted_loss_rate(snapshot),
            LossModel::AggregateRetransmit => aggregate_loss_rate(snapshot),
        };
        MetricRecord::new(relative_time_secs, aggregate_throughput, max_latency, loss)
    }
}

/// Per-subflow loss averaged with throughput-share weights.
///
/// `Σ(w_i · loss_i) / Σ(w_i)` with `w_i = segments_out_i`; 0 by convention
/// when no subflow sent anything (no division by zero).
#[must_use]
pub fn weighted_loss_rate(snapshot: &SubflowSnapshot) -> f64 {
    let total: f64 = snapshot.iter().map(|c| c.segments_out as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = snapshot
        .iter()
        .map(|c| c.segments_out as f64 * c.loss_fraction())
        .sum();
    weighted / total
}

/// Alternate loss definition: total retransmits over total segments.
///
/// Clamped into `[0, 1]`; 0 by convention when no subflow sent anything.
#[must_use]
pub fn aggregate_loss_rate(snapshot: &SubflowSnapshot) -> f64 {
    let segments: u64 = snapshot.iter().map(|c| c.segments_out).sum();
    if segments == 0 {
        return 0.0;
    }
    let retransmits: u64 = snapshot.iter().map(|c| c.retransmits).sum();
    (retransmits as f64 / segments as f64).min(1.0)
}
