//! Error types for schedbench
//!
//! One trial's failure is recorded, never propagated past the trial boundary;
//! only errors that make the whole run meaningless surface as `Err` from the
//! orchestrator.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Schedbench error types
#[derive(Error, Debug)]
pub enum Error {
    /// The kernel subflow-stats extension is missing or rejected the query.
    /// Fatal to the whole run when hit on the very first trial: without
    /// telemetry nothing is measurable.
    #[error("subflow stats provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Switching the active scheduling policy failed. Fatal to one trial,
    /// never to the run.
    #[error("scheduler switch to '{scheduler}' failed: {reason}")]
    SchedulerSwitch {
        /// Policy name the switch was attempting to activate
        scheduler: String,
        /// What the controller reported
        reason: String,
    },

    /// The trial's connection failed mid-traffic; collected records are kept.
    #[error("connection error: {0}")]
    Connection(String),

    /// The provider handed back a positional counter array that is too short
    /// to carry the documented fields.
    #[error("malformed subflow counters: expected {expected} fields, got {actual}")]
    MalformedCounters {
        /// Number of positional fields the provider contract promises
        expected: usize,
        /// Number of fields actually received
        actual: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized trial-result transport error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Metric file export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
