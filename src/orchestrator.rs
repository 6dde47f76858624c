//! Experiment orchestration
//!
//! Trials run strictly one at a time, in the given order. The scheduler
//! selection is process-wide kernel state, so concurrent trials would
//! corrupt each other's attribution; serialization is the locking
//! discipline.
//!
//! Failure containment: one trial's abort is logged and the next config
//! still runs. The single exception is a stats provider found unavailable on
//! the very first trial, which makes the whole run unmeasurable.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::exec::TrialExecutor;
use crate::trial::{AbortReason, TrialConfig, TrialResult, TrialStatus};
use crate::{Error, Result};

/// Completed experiment: one [`TrialResult`] per attempted scheduler, in
/// config submission order. Read-only once built.
///
/// Every attempted trial appears with its status; an aborted trial is never
/// silently dropped.
#[derive(Debug, Default, Clone)]
pub struct ComparisonSet {
    order: Vec<String>,
    results: HashMap<String, TrialResult>,
}

impl ComparisonSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trials in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set holds no trials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up one scheduler's result by name.
    #[must_use]
    pub fn get(&self, scheduler: &str) -> Option<&TrialResult> {
        self.results.get(scheduler)
    }

    /// Scheduler names in submission order.
    pub fn schedulers(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Iterate `(scheduler, result)` pairs in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrialResult)> {
        self.order
            .iter()
            .filter_map(|name| self.results.get(name).map(|r| (name.as_str(), r)))
    }

    /// Add one trial's result, keeping submission order. A repeated
    /// scheduler name keeps the latest trial.
    fn insert(&mut self, result: TrialResult) {
        let scheduler = result.config().scheduler().to_string();
        if self.results.insert(scheduler.clone(), result).is_some() {
            // Repeated scheduler name in the config list; the later trial
            // survives.
            tracing::warn!(scheduler = %scheduler, "duplicate scheduler name, keeping latest trial");
        } else {
            self.order.push(scheduler);
        }
    }
}

impl FromIterator<TrialResult> for ComparisonSet {
    fn from_iter<I: IntoIterator<Item = TrialResult>>(iter: I) -> Self {
        let mut set = Self::new();
        for result in iter {
            set.insert(result);
        }
        set
    }
}

/// Sequences isolated trials across scheduler configurations and assembles
/// their results for comparison.
#[derive(Debug)]
pub struct ExperimentOrchestrator<E> {
    executor: E,
}

impl<E: TrialExecutor> ExperimentOrchestrator<E> {
    /// Create an orchestrator driving trials through `executor`.
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Run one trial per config, strictly sequentially, and collect every
    /// terminal result.
    ///
    /// Cancellation observed between trials skips all remaining configs;
    /// results already collected are retained.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderUnavailable`] only when the very first trial
    /// aborts because the stats provider is missing; with no telemetry
    /// source, nothing in the run is measurable.
    pub async fn run_all(
        &self,
        configs: &[TrialConfig],
        cancel: &CancellationToken,
    ) -> Result<ComparisonSet> {
        let mut set = ComparisonSet::new();

        for (index, config) in configs.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(
                    completed = set.len(),
                    skipped = configs.len() - index,
                    "cancellation observed between trials, skipping the rest"
                );
                break;
            }

            tracing::info!(
                scheduler = config.scheduler(),
                trial = index + 1,
                total = configs.len(),
                "running trial"
            );
            let result = self.executor.execute(config, cancel).await;

            if index == 0 {
                if let TrialStatus::Aborted(AbortReason::ProviderUnavailable(reason)) =
                    result.status()
                {
                    return Err(Error::ProviderUnavailable(reason.clone()));
                }
            }
            if let TrialStatus::Aborted(reason) = result.status() {
                tracing::warn!(
                    scheduler = config.scheduler(),
                    %reason,
                    "trial aborted, continuing with next configuration"
                );
            }
            set.insert(result);
        }

        Ok(set)
    }
}
