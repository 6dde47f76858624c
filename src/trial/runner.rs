//! Trial runner: one scheduler, one connection, one timed measurement
//!
//! State machine: `Idle -> Configuring -> Active -> {Completed | Aborted}`.
//! The active phase interleaves traffic generation and fixed-interval
//! sampling in a single paced loop, the same shape as the original
//! measurement client; sampling cadence is never starved because every send
//! is bounded by the connection's own write readiness and the pacing sleep
//! yields to the timer wheel each iteration.
//!
//! Cancellation is cooperative and checked at loop granularity, never
//! mid-send. Partial results are never discarded: whatever records were
//! collected before an abort ride along in the result.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::sampler::SubflowSampler;
use crate::scheduler::SchedulerController;
use crate::subflow::SubflowStatsProvider;
use crate::traffic::{Connector, TrafficGenerator};
use crate::trial::{AbortReason, TrialConfig, TrialResult, TrialStatus};
use crate::Error;

/// Interval between sampling ticks.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Pacing sleep between traffic iterations, keeping the loop cooperative.
pub const SEND_PACING: Duration = Duration::from_millis(50);

/// Delay between a successful scheduler switch and traffic start, letting
/// the switch take effect kernel-side.
pub const SCHEDULER_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Tunable knobs of the trial loop. Defaults mirror the module constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Interval between sampling ticks.
    pub sample_interval: Duration,
    /// Pacing sleep between traffic iterations.
    pub send_pacing: Duration,
    /// Post-switch settling delay before traffic starts.
    pub settle_delay: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            sample_interval: SAMPLE_INTERVAL,
            send_pacing: SEND_PACING,
            settle_delay: SCHEDULER_SETTLE_DELAY,
        }
    }
}

/// Drives one trial end to end: scheduler switch, settle, connect, then the
/// interleaved traffic/sampling loop until duration, cancellation, or
/// failure.
///
/// The connection handle is exclusively owned by the trial; nothing is
/// shared across trials.
#[derive(Debug)]
pub struct TrialRunner<C, P, G, S> {
    connector: C,
    provider: P,
    traffic: G,
    scheduler: S,
    sampler: SubflowSampler,
    options: RunnerOptions,
}

impl<C, P, G, S> TrialRunner<C, P, G, S>
where
    C: Connector,
    P: SubflowStatsProvider<C::Handle> + Send + Sync,
    G: TrafficGenerator<C::Handle>,
    S: SchedulerController,
{
    /// Assemble a runner from its collaborators with default options.
    #[must_use]
    pub fn new(connector: C, provider: P, traffic: G, scheduler: S) -> Self {
        Self {
            connector,
            provider,
            traffic,
            scheduler,
            sampler: SubflowSampler::new(),
            options: RunnerOptions::default(),
        }
    }

    /// Replace the sampler (e.g. to select the aggregate-retransmit loss
    /// model).
    #[must_use]
    pub fn with_sampler(mut self, sampler: SubflowSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Replace the loop options.
    #[must_use]
    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one trial to a terminal state.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// result's status so the orchestrator can keep going.
    pub async fn run(&self, config: &TrialConfig, cancel: &CancellationToken) -> TrialResult {
        let mut result = TrialResult::begin(config.clone());
        tracing::info!(
            scheduler = config.scheduler(),
            endpoint = %config.endpoint(),
            duration_secs = config.duration().as_secs(),
            "trial starting"
        );

        // Configuring: switch the policy, then let the switch settle before
        // any traffic is attempted.
        if let Err(err) = self.scheduler.set_policy(config.scheduler()).await {
            result.finish(TrialStatus::Aborted(AbortReason::SchedulerSwitchFailed(
                err.to_string(),
            )));
            return result;
        }
        tokio::time::sleep(self.options.settle_delay).await;
        if cancel.is_cancelled() {
            result.finish(TrialStatus::Aborted(AbortReason::Cancelled));
            return result;
        }

        let mut handle = match self.connector.connect(config.endpoint()).await {
            Ok(handle) => handle,
            Err(err) => {
                result.finish(TrialStatus::Aborted(AbortReason::Connection(err.to_string())));
                return result;
            }
        };

        // Active: relative time starts at 0 here, after settle and connect.
        let start = Instant::now();
        let deadline = start + config.duration();
        let mut next_sample = start + self.options.sample_interval;

        let status = loop {
            if cancel.is_cancelled() {
                break TrialStatus::Aborted(AbortReason::Cancelled);
            }
            if Instant::now() >= deadline {
                break TrialStatus::Completed;
            }

            if let Err(err) = self.traffic.send_once(&mut handle).await {
                break TrialStatus::Aborted(AbortReason::Connection(err.to_string()));
            }
            if let Err(err) = self.traffic.try_receive(&mut handle).await {
                break TrialStatus::Aborted(AbortReason::Connection(err.to_string()));
            }

            if Instant::now() >= next_sample {
                match self.provider.snapshot(&handle) {
                    Ok(snapshot) => {
                        let relative = start.elapsed().as_secs_f64();
                        result.push_record(self.sampler.sample(relative, &snapshot));
                        next_sample += self.options.sample_interval;
                    }
                    Err(err @ (Error::ProviderUnavailable(_) | Error::MalformedCounters { .. })) => {
                        break TrialStatus::Aborted(AbortReason::ProviderUnavailable(
                            err.to_string(),
                        ));
                    }
                    Err(err) => {
                        break TrialStatus::Aborted(AbortReason::Connection(err.to_string()));
                    }
                }
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    break TrialStatus::Aborted(AbortReason::Cancelled);
                }
                () = tokio::time::sleep(self.options.send_pacing) => {}
            }
        };

        match &status {
            TrialStatus::Completed => tracing::info!(
                scheduler = config.scheduler(),
                records = result.records().len(),
                "trial completed"
            ),
            TrialStatus::Aborted(reason) => tracing::warn!(
                scheduler = config.scheduler(),
                records = result.records().len(),
                %reason,
                "trial aborted"
            ),
        }
        result.finish(status);
        result
    }
}
