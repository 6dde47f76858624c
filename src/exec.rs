//! Trial execution boundary
//!
//! The orchestrator only ever sees [`TrialExecutor`]; whether a trial runs
//! over a direct socket in-process or inside an isolated network namespace
//! is a variation point behind this trait, not a separate driver.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::scheduler::SchedulerController;
use crate::subflow::SubflowStatsProvider;
use crate::traffic::{Connector, TrafficGenerator};
use crate::trial::{
    AbortReason, MetricRecord, RunnerOptions, TrialConfig, TrialResult, TrialRunner, TrialStatus,
};

/// Runs one trial to a terminal state.
///
/// Implementations never return errors; every failure mode is folded into
/// the result's status so one scheduler's failure cannot block measuring the
/// others.
#[async_trait]
pub trait TrialExecutor: Send + Sync {
    /// Execute the trial described by `config`, observing `cancel`
    /// cooperatively.
    async fn execute(&self, config: &TrialConfig, cancel: &CancellationToken) -> TrialResult;
}

#[async_trait]
impl<C, P, G, S> TrialExecutor for TrialRunner<C, P, G, S>
where
    C: Connector,
    P: SubflowStatsProvider<C::Handle> + Send + Sync,
    G: TrafficGenerator<C::Handle>,
    S: SchedulerController,
{
    async fn execute(&self, config: &TrialConfig, cancel: &CancellationToken) -> TrialResult {
        self.run(config, cancel).await
    }
}

/// Isolated trial executor: the traffic-and-sampling loop runs as a helper
/// process inside a network namespace, and its records come back as a JSON
/// file.
///
/// The invocation is always a program name plus an explicit argument vector
/// (`ip netns exec <ns> <helper> --ip .. --port .. --duration ..
/// --output ..`); no shell text is ever assembled.
#[derive(Debug)]
pub struct NamespaceExecutor<S> {
    scheduler: S,
    namespace: String,
    netns_program: PathBuf,
    helper: PathBuf,
    output_dir: PathBuf,
    settle_delay: Duration,
}

impl<S: SchedulerController> NamespaceExecutor<S> {
    /// Create an executor running `helper` inside `namespace`, writing
    /// per-trial record files under `output_dir`.
    #[must_use]
    pub fn new(
        scheduler: S,
        namespace: impl Into<String>,
        helper: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            scheduler,
            namespace: namespace.into(),
            netns_program: PathBuf::from("ip"),
            helper: helper.into(),
            output_dir: output_dir.into(),
            settle_delay: RunnerOptions::default().settle_delay,
        }
    }

    /// Override the post-switch settling delay.
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Override the program used to enter the namespace (`ip` by default).
    /// Lets tests substitute a stub for the real `ip netns exec`.
    #[must_use]
    pub fn with_netns_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.netns_program = program.into();
        self
    }

    fn record_file(&self, config: &TrialConfig) -> PathBuf {
        self.output_dir
            .join(format!("trial_{}.json", config.scheduler()))
    }

    async fn read_records(&self, config: &TrialConfig) -> crate::Result<Vec<MetricRecord>> {
        let raw = tokio::fs::read(self.record_file(config)).await?;
        let records: Vec<MetricRecord> = serde_json::from_slice(&raw)?;
        // The file crossed a process boundary; time ordering is validated
        // here rather than trusted.
        let ordered = records
            .windows(2)
            .all(|pair| pair[0].relative_time_secs() < pair[1].relative_time_secs());
        if !ordered {
            return Err(Error::Connection("unordered helper output".into()));
        }
        Ok(records)
    }

    async fn run_helper(
        &self,
        config: &TrialConfig,
        cancel: &CancellationToken,
    ) -> Result<(), AbortReason> {
        let output_file = self.record_file(config);
        let mut child = Command::new(&self.netns_program)
            .arg("netns")
            .arg("exec")
            .arg(&self.namespace)
            .arg(&self.helper)
            .arg("--ip")
            .arg(&config.endpoint().host)
            .arg("--port")
            .arg(config.endpoint().port.to_string())
            .arg("--duration")
            .arg(config.duration().as_secs().to_string())
            .arg("--output")
            .arg(&output_file)
            .spawn()
            .map_err(|e| AbortReason::Connection(format!("spawn netns helper: {e}")))?;

        tokio::select! {
            () = cancel.cancelled() => {
                // Cooperative shutdown of the helper; records written so far
                // stay on disk and are still collected.
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(AbortReason::Cancelled)
            }
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(AbortReason::Connection(format!(
                    "netns helper exited with {status}"
                ))),
                Err(e) => Err(AbortReason::Connection(format!("netns helper wait: {e}"))),
            },
        }
    }
}

#[async_trait]
impl<S: SchedulerController> TrialExecutor for NamespaceExecutor<S> {
    async fn execute(&self, config: &TrialConfig, cancel: &CancellationToken) -> TrialResult {
        let mut result = TrialResult::begin(config.clone());
        tracing::info!(
            scheduler = config.scheduler(),
            namespace = %self.namespace,
            "isolated trial starting"
        );

        if let Err(err) = self.scheduler.set_policy(config.scheduler()).await {
            result.finish(TrialStatus::Aborted(AbortReason::SchedulerSwitchFailed(
                err.to_string(),
            )));
            return result;
        }
        tokio::time::sleep(self.settle_delay).await;
        if cancel.is_cancelled() {
            result.finish(TrialStatus::Aborted(AbortReason::Cancelled));
            return result;
        }

        let helper_outcome = self.run_helper(config, cancel).await;

        // Collect whatever the helper managed to write, even after an abort.
        match self.read_records(config).await {
            Ok(records) => {
                for record in records {
                    result.push_record(record);
                }
            }
            Err(err) => {
                if helper_outcome.is_ok() {
                    let reason = match err {
                        Error::Connection(reason) => reason,
                        other => format!("unreadable helper output: {other}"),
                    };
                    result.finish(TrialStatus::Aborted(AbortReason::Connection(reason)));
                    return result;
                }
                tracing::debug!(
                    scheduler = config.scheduler(),
                    error = %err,
                    "no helper records recovered after abort"
                );
            }
        }

        match helper_outcome {
            Ok(()) => result.finish(TrialStatus::Completed),
            Err(reason) => result.finish(TrialStatus::Aborted(reason)),
        }
        result
    }
}
