#![allow(dead_code)]
//! Shared test doubles for runner and orchestrator tests
//!
//! The kernel stats source, the traffic path, and the privileged scheduler
//! switch are all external collaborators; these doubles script their
//! behavior deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use schedbench::{
    Connector, Endpoint, Error, Result, SchedulerController, SubflowCounters, SubflowSnapshot,
    SubflowStatsProvider, TrafficGenerator, TrialConfig,
};

/// Install a test subscriber once so `RUST_LOG` controls trial/orchestrator
/// output during debugging.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stand-in connection handle; carries no state of its own.
pub struct MockConn;

/// Connector that hands out [`MockConn`] handles, optionally refusing.
#[derive(Default)]
pub struct MockConnector {
    pub refuse: bool,
    pub connects: Arc<AtomicUsize>,
}

#[async_trait]
impl Connector for MockConnector {
    type Handle = MockConn;

    async fn connect(&self, endpoint: &Endpoint) -> Result<MockConn> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            Err(Error::Connection(format!("{endpoint} refused")))
        } else {
            Ok(MockConn)
        }
    }
}

/// Scheduler controller that records every switch and fails for one
/// configured policy name.
#[derive(Default)]
pub struct MockScheduler {
    pub fail_for: Option<String>,
    pub switches: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SchedulerController for MockScheduler {
    async fn set_policy(&self, name: &str) -> Result<()> {
        self.switches.lock().unwrap().push(name.to_string());
        match &self.fail_for {
            Some(bad) if bad == name => Err(Error::SchedulerSwitch {
                scheduler: name.to_string(),
                reason: "unknown scheduler".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Traffic generator that succeeds instantly, optionally dropping the
/// connection after a fixed number of sends.
#[derive(Default)]
pub struct MockTraffic {
    pub fail_after_sends: Option<usize>,
    pub sends: Arc<AtomicUsize>,
}

#[async_trait]
impl TrafficGenerator<MockConn> for MockTraffic {
    async fn send_once(&self, _handle: &mut MockConn) -> Result<usize> {
        let n = self.sends.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after_sends {
            if n >= limit {
                return Err(Error::Connection("connection reset by peer".into()));
            }
        }
        Ok(1024)
    }

    async fn try_receive(&self, _handle: &mut MockConn) -> Result<Option<usize>> {
        Ok(None)
    }
}

/// Stats provider replaying one fixed snapshot, optionally becoming
/// unavailable after a fixed number of reads.
pub struct ScriptedStats {
    pub snapshot: SubflowSnapshot,
    pub unavailable_after: Option<usize>,
    pub reads: Arc<AtomicUsize>,
}

impl ScriptedStats {
    pub fn healthy() -> Self {
        Self {
            snapshot: two_subflow_snapshot(),
            unavailable_after: None,
            reads: Arc::default(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable_after: Some(0),
            ..Self::healthy()
        }
    }
}

impl SubflowStatsProvider<MockConn> for ScriptedStats {
    fn snapshot(&self, _handle: &MockConn) -> Result<SubflowSnapshot> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.unavailable_after {
            if n >= limit {
                return Err(Error::ProviderUnavailable(
                    "mpsched kernel module not loaded".into(),
                ));
            }
        }
        Ok(self.snapshot.clone())
    }
}

/// Reference snapshot: 400 segments total, worst RTT 50, weighted loss
/// 0.025.
pub fn two_subflow_snapshot() -> SubflowSnapshot {
    SubflowSnapshot::new(vec![
        SubflowCounters {
            segments_out: 100,
            rtt_us: 50,
            cwnd: 10,
            unacked: 0,
            retransmits: 10,
        },
        SubflowCounters {
            segments_out: 300,
            rtt_us: 30,
            cwnd: 12,
            unacked: 2,
            retransmits: 0,
        },
    ])
}

/// A trial config pointing at a reserved-range endpoint nothing listens on.
pub fn config(scheduler: &str, secs: u64) -> TrialConfig {
    TrialConfig::new(
        scheduler,
        Duration::from_secs(secs),
        Endpoint::new("192.0.2.1", 5001),
    )
}
