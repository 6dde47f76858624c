//! Trial results: aggregated metric records and terminal status
//!
//! A [`TrialResult`] is append-only while its trial runs and never mutated
//! after the trial reaches a terminal state. Records are strictly increasing
//! in relative time by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TrialConfig;

/// One aggregated observation from one sampling tick.
///
/// Serialized field names match the persisted per-scheduler file columns:
/// `time, aggregate_throughput, max_latency, weighted_loss_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "time")]
    relative_time_secs: f64,
    aggregate_throughput: f64,
    max_latency: f64,
    weighted_loss_rate: f64,
}

impl MetricRecord {
    /// Create a metric record.
    ///
    /// `relative_time_secs` counts from the owning trial's start, so records
    /// of different trials share no common axis beyond "seconds since trial
    /// start".
    #[must_use]
    pub const fn new(
        relative_time_secs: f64,
        aggregate_throughput: f64,
        max_latency: f64,
        weighted_loss_rate: f64,
    ) -> Self {
        Self {
            relative_time_secs,
            aggregate_throughput,
            max_latency,
            weighted_loss_rate,
        }
    }

    /// Seconds since the owning trial started.
    #[must_use]
    pub const fn relative_time_secs(&self) -> f64 {
        self.relative_time_secs
    }

    /// Sum of per-subflow throughput contributions, in segments.
    #[must_use]
    pub const fn aggregate_throughput(&self) -> f64 {
        self.aggregate_throughput
    }

    /// Worst per-subflow round-trip time, in microseconds. 0 when the
    /// snapshot held no subflows.
    #[must_use]
    pub const fn max_latency(&self) -> f64 {
        self.max_latency
    }

    /// Loss rate in `[0, 1]` under the sampler's configured loss model.
    /// 0 by convention when aggregate throughput is 0.
    #[must_use]
    pub const fn weighted_loss_rate(&self) -> f64 {
        self.weighted_loss_rate
    }
}

/// Why a trial ended before its configured duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    /// The scheduler-switch collaborator rejected the policy name; no
    /// traffic was attempted.
    SchedulerSwitchFailed(String),
    /// Cooperative cancellation was observed mid-trial.
    Cancelled,
    /// The connection failed during traffic generation.
    Connection(String),
    /// The subflow stats provider failed; without telemetry the trial
    /// cannot continue.
    ProviderUnavailable(String),
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchedulerSwitchFailed(reason) => {
                write!(f, "scheduler-switch failed: {reason}")
            }
            Self::Cancelled => write!(f, "cancelled"),
            Self::Connection(reason) => write!(f, "connection error: {reason}"),
            Self::ProviderUnavailable(reason) => {
                write!(f, "stats provider unavailable: {reason}")
            }
        }
    }
}

/// Terminal status of a trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    /// The trial ran its full configured duration.
    Completed,
    /// The trial ended early; collected records are preserved.
    Aborted(AbortReason),
}

impl TrialStatus {
    /// Whether the trial ran to its configured duration.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// One trial's configuration, time-ordered metric records, and terminal
/// status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    config: TrialConfig,
    records: Vec<MetricRecord>,
    status: TrialStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl TrialResult {
    /// Start assembling a result for `config`, stamping the wall-clock start.
    #[must_use]
    pub fn begin(config: TrialConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            status: TrialStatus::Completed,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Append one sampling tick's record.
    ///
    /// Records arrive in tick order from a single sampling loop; appending
    /// out of relative-time order is a caller bug and panics in debug builds.
    pub fn push_record(&mut self, record: MetricRecord) {
        debug_assert!(
            self.records
                .last()
                .map_or(true, |last| last.relative_time_secs() < record.relative_time_secs()),
            "metric records must be strictly increasing in relative time"
        );
        self.records.push(record);
    }

    /// Seal the result with its terminal status, stamping the wall-clock end.
    pub fn finish(&mut self, status: TrialStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// The trial's immutable configuration.
    #[must_use]
    pub const fn config(&self) -> &TrialConfig {
        &self.config
    }

    /// Time-ordered metric records, one per completed sampling tick.
    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    /// Terminal status.
    #[must_use]
    pub const fn status(&self) -> &TrialStatus {
        &self.status
    }

    /// Wall-clock instant the trial started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock instant the trial reached a terminal state, if sealed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::Endpoint;
    use std::time::Duration;

    fn config() -> TrialConfig {
        TrialConfig::new(
            "default",
            Duration::from_secs(10),
            Endpoint::new("10.0.0.2", 5001),
        )
    }

    #[test]
    fn test_result_lifecycle() {
        let mut result = TrialResult::begin(config());
        assert!(result.ended_at().is_none());
        result.push_record(MetricRecord::new(1.0, 400.0, 50.0, 0.025));
        result.finish(TrialStatus::Completed);
        assert!(result.status().is_completed());
        assert!(result.ended_at().is_some());
        assert_eq!(result.records().len(), 1);
    }

    #[test]
    fn test_abort_reason_display() {
        let reason = AbortReason::SchedulerSwitchFailed("unknown policy".into());
        assert_eq!(reason.to_string(), "scheduler-switch failed: unknown policy");
        assert_eq!(AbortReason::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_result_json_round_trip() {
        // The namespace executor moves results across a process boundary as
        // JSON; status and records must survive intact.
        let mut result = TrialResult::begin(config());
        result.push_record(MetricRecord::new(1.0, 400.0, 50.0, 0.025));
        result.finish(TrialStatus::Aborted(AbortReason::Cancelled));
        let json = serde_json::to_string(&result).unwrap();
        let back: TrialResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    #[cfg(debug_assertions)]
    fn test_out_of_order_record_panics_in_debug() {
        let mut result = TrialResult::begin(config());
        result.push_record(MetricRecord::new(2.0, 0.0, 0.0, 0.0));
        result.push_record(MetricRecord::new(1.0, 0.0, 0.0, 0.0));
    }
}
