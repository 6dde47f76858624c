//! Namespace executor edge behavior
//!
//! The helper binary and its output file are external collaborators; a stub
//! program stands in for `ip netns exec` so every failure path is reachable
//! without namespaces or root.

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use schedbench::{
    AbortReason, Endpoint, MetricRecord, NamespaceExecutor, TrialConfig, TrialExecutor,
    TrialStatus,
};
use tokio_util::sync::CancellationToken;

use common::{init_tracing, MockScheduler};

fn config(scheduler: &str) -> TrialConfig {
    TrialConfig::new(
        scheduler,
        Duration::from_secs(5),
        Endpoint::new("10.0.0.2", 5001),
    )
}

fn executor(program: &str, output_dir: &Path) -> NamespaceExecutor<MockScheduler> {
    NamespaceExecutor::new(
        MockScheduler::default(),
        "bench-ns",
        "/usr/lib/schedbench/helper",
        output_dir,
    )
    .with_netns_program(program)
    .with_settle_delay(Duration::ZERO)
}

fn seed_records(output_dir: &Path, scheduler: &str, records: &[MetricRecord]) {
    let path = output_dir.join(format!("trial_{scheduler}.json"));
    std::fs::write(path, serde_json::to_vec(records).unwrap()).unwrap();
}

#[tokio::test]
async fn test_successful_helper_yields_completed_trial_with_records() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    seed_records(
        dir.path(),
        "blest",
        &[
            MetricRecord::new(1.0, 400.0, 50.0, 0.025),
            MetricRecord::new(2.0, 410.0, 48.0, 0.02),
        ],
    );

    let exec = executor("true", dir.path());
    let result = exec.execute(&config("blest"), &CancellationToken::new()).await;

    assert_eq!(*result.status(), TrialStatus::Completed);
    assert_eq!(result.records().len(), 2);
    assert!((result.records()[0].aggregate_throughput() - 400.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_unordered_helper_output_aborts_instead_of_panicking() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // Valid JSON whose timestamps run backwards; the executor must treat it
    // as bad external input, not as its own append-order bug.
    seed_records(
        dir.path(),
        "default",
        &[
            MetricRecord::new(2.0, 400.0, 50.0, 0.025),
            MetricRecord::new(1.0, 380.0, 52.0, 0.03),
        ],
    );

    let exec = executor("true", dir.path());
    let result = exec
        .execute(&config("default"), &CancellationToken::new())
        .await;

    match result.status() {
        TrialStatus::Aborted(AbortReason::Connection(reason)) => {
            assert!(reason.contains("unordered"), "reason: {reason}");
        }
        other => panic!("expected connection abort, got {other:?}"),
    }
    assert!(result.records().is_empty());
}

#[tokio::test]
async fn test_helper_exit_failure_keeps_partial_records() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    seed_records(
        dir.path(),
        "roundrobin",
        &[MetricRecord::new(1.0, 400.0, 50.0, 0.025)],
    );

    let exec = executor("false", dir.path());
    let result = exec
        .execute(&config("roundrobin"), &CancellationToken::new())
        .await;

    match result.status() {
        TrialStatus::Aborted(AbortReason::Connection(reason)) => {
            assert!(reason.contains("exited"), "reason: {reason}");
        }
        other => panic!("expected connection abort, got {other:?}"),
    }
    assert_eq!(result.records().len(), 1);
}

#[tokio::test]
async fn test_missing_output_file_aborts_as_unreadable() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let exec = executor("true", dir.path());
    let result = exec
        .execute(&config("redundant"), &CancellationToken::new())
        .await;

    match result.status() {
        TrialStatus::Aborted(AbortReason::Connection(reason)) => {
            assert!(reason.contains("unreadable helper output"), "reason: {reason}");
        }
        other => panic!("expected connection abort, got {other:?}"),
    }
    assert!(result.records().is_empty());
}

#[tokio::test]
async fn test_cancellation_kills_helper_and_recovers_partial_records() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // Long-running stand-in for the helper so cancellation, not exit, ends
    // the trial.
    let stub = dir.path().join("hang.sh");
    std::fs::write(&stub, "#!/bin/sh\nsleep 30\n").unwrap();
    std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
    seed_records(
        dir.path(),
        "blest",
        &[MetricRecord::new(1.0, 400.0, 50.0, 0.025)],
    );

    let exec = executor(stub.to_str().unwrap(), dir.path());
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let result = exec.execute(&config("blest"), &cancel).await;

    assert!(started.elapsed() < Duration::from_secs(10), "helper was not killed");
    assert_eq!(
        *result.status(),
        TrialStatus::Aborted(AbortReason::Cancelled)
    );
    assert_eq!(result.records().len(), 1);
}

#[tokio::test]
async fn test_switch_failure_never_spawns_helper() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let exec = NamespaceExecutor::new(
        MockScheduler {
            fail_for: Some("lia".into()),
            ..MockScheduler::default()
        },
        "bench-ns",
        "/usr/lib/schedbench/helper",
        dir.path(),
    )
    .with_netns_program("false")
    .with_settle_delay(Duration::ZERO);

    let result = exec.execute(&config("lia"), &CancellationToken::new()).await;

    assert!(matches!(
        result.status(),
        TrialStatus::Aborted(AbortReason::SchedulerSwitchFailed(_))
    ));
    assert!(result.records().is_empty());
}
