//! Scheduling-policy selection
//!
//! The active MPTCP scheduler is process-wide kernel state written through
//! `sysctl`. Strict trial serialization substitutes for locking: there is
//! only ever one writer by construction.

use async_trait::async_trait;
use tokio::process::Command;

use crate::{Error, Result};

/// Default sysctl key holding the active MPTCP scheduler.
pub const SCHEDULER_SYSCTL_KEY: &str = "net.mptcp.mptcp_scheduler";

/// Switches the active scheduling policy.
///
/// Failure is fatal to the requesting trial and non-fatal to the
/// orchestrator.
#[async_trait]
pub trait SchedulerController: Send + Sync {
    /// Activate the named policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchedulerSwitch`] when the policy cannot be
    /// activated (unknown name, missing privilege, no MPTCP stack).
    async fn set_policy(&self, name: &str) -> Result<()>;
}

/// Policy switch via `sysctl <key>=<name>`.
///
/// Always a fixed program name plus an explicit argument list; no shell is
/// involved.
#[derive(Debug, Clone)]
pub struct SysctlScheduler {
    key: String,
}

impl SysctlScheduler {
    /// Controller for the default key [`SCHEDULER_SYSCTL_KEY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_key(SCHEDULER_SYSCTL_KEY)
    }

    /// Controller for a non-default sysctl key (older kernel trees expose
    /// the scheduler under different names).
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Default for SysctlScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchedulerController for SysctlScheduler {
    async fn set_policy(&self, name: &str) -> Result<()> {
        let assignment = format!("{}={name}", self.key);
        let output = Command::new("sysctl")
            .arg("-w")
            .arg(&assignment)
            .output()
            .await
            .map_err(|e| Error::SchedulerSwitch {
                scheduler: name.to_string(),
                reason: format!("failed to invoke sysctl: {e}"),
            })?;

        if output.status.success() {
            tracing::info!(scheduler = name, "active scheduler switched");
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("sysctl exited with {}", output.status)
            } else {
                stderr
            };
            tracing::debug!(scheduler = name, %reason, "sysctl rejected the switch");
            Err(Error::SchedulerSwitch {
                scheduler: name.to_string(),
                reason,
            })
        }
    }
}
