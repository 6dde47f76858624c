//! # Schedbench: MPTCP Scheduler Comparison Benchkit
//!
//! Schedbench measures and compares transport-layer scheduling policies on a
//! multi-path connection. It periodically samples per-subflow kernel
//! counters, reduces them to comparable scalar metrics (aggregate
//! throughput, worst-subflow latency, throughput-weighted loss rate), and
//! runs one isolated trial per policy under test, strictly sequentially.
//!
//! ## Architecture
//!
//! ```text
//! ExperimentOrchestrator ──> TrialExecutor (direct TrialRunner | NamespaceExecutor)
//!                                │
//!                                ├── SchedulerController  (sysctl policy switch)
//!                                ├── Connector / TrafficGenerator  (paced sends)
//!                                └── SubflowStatsProvider ──> SubflowSampler ──> MetricRecord
//! ```
//!
//! Trials never run concurrently: the active scheduler is process-wide
//! kernel state, and serialization is what keeps each trial's attribution
//! honest. One trial's failure is recorded in its [`TrialResult`] and never
//! blocks the remaining schedulers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use schedbench::{Endpoint, ExperimentOrchestrator, TrialConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # use schedbench::{SubflowSnapshot, SubflowStatsProvider};
//! # struct KernelStats;
//! # impl SubflowStatsProvider<tokio::net::TcpStream> for KernelStats {
//! #     fn snapshot(&self, _: &tokio::net::TcpStream) -> schedbench::Result<SubflowSnapshot> {
//! #         Ok(SubflowSnapshot::default())
//! #     }
//! # }
//! # async fn run() -> schedbench::Result<()> {
//! let runner = schedbench::TrialRunner::new(
//!     schedbench::TcpConnector,
//!     KernelStats,
//!     schedbench::TcpTraffic::new(),
//!     schedbench::SysctlScheduler::new(),
//! );
//! let orchestrator = ExperimentOrchestrator::new(runner);
//!
//! let endpoint = Endpoint::new("10.0.0.2", 5001);
//! let configs: Vec<TrialConfig> = ["default", "roundrobin", "blest"]
//!     .iter()
//!     .map(|s| TrialConfig::new(*s, Duration::from_secs(10), endpoint.clone()))
//!     .collect();
//!
//! let cancel = CancellationToken::new();
//! let comparison = orchestrator.run_all(&configs, &cancel).await?;
//! schedbench::report::export_csv(&comparison, std::path::Path::new("."), "metrics")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod exec;
pub mod orchestrator;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod subflow;
pub mod traffic;
pub mod trial;

pub use error::{Error, Result};
pub use exec::{NamespaceExecutor, TrialExecutor};
pub use orchestrator::{ComparisonSet, ExperimentOrchestrator};
pub use report::ComparativeReporter;
pub use sampler::{LossModel, SamplerConfig, SubflowSampler};
pub use scheduler::{SchedulerController, SysctlScheduler};
pub use subflow::{SubflowCounters, SubflowSnapshot, SubflowStatsProvider};
pub use traffic::{Connector, TcpConnector, TcpTraffic, TrafficGenerator};
pub use trial::{
    AbortReason, Endpoint, MetricRecord, RunnerOptions, TrialConfig, TrialResult, TrialRunner,
    TrialStatus,
};
