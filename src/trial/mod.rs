//! Trial lifecycle: configuration, result assembly, and the runner that
//! drives one scheduler's timed measurement end to end.

mod config;
mod result;
mod runner;

pub use config::{Endpoint, TrialConfig};
pub use result::{AbortReason, MetricRecord, TrialResult, TrialStatus};
pub use runner::{RunnerOptions, TrialRunner};
