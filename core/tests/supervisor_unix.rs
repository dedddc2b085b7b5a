//! End-to-end supervisor tests against real processes.

#![cfg(unix)]

use std::process::Command;
use std::time::{Duration, Instant};

use agentd_core::{
    EscalationBudget, Phase, PlatformBackend, StartStatus, StopStatus, Supervisor, WorkerCommand,
};

const RUNG: Duration = Duration::from_millis(400);
const SLACK: Duration = Duration::from_secs(2);

fn supervisor(command: WorkerCommand) -> Supervisor<PlatformBackend> {
    Supervisor::new(PlatformBackend::new(), command, EscalationBudget::uniform(RUNG))
}

fn shell(script: &str) -> WorkerCommand {
    WorkerCommand::new("sh").args(["-c", script])
}

/// True once `pid` no longer exists or is only a zombie.
fn is_gone(pid: u32) -> bool {
    let output = Command::new("ps")
        .args(["-o", "stat=", "-p", &pid.to_string()])
        .output()
        .expect("ps should run");
    let stat = String::from_utf8_lossy(&output.stdout);
    let stat = stat.trim();
    stat.is_empty() || stat.starts_with('Z')
}

async fn wait_until_gone(pid: u32) -> bool {
    let deadline = Instant::now() + SLACK;
    while Instant::now() < deadline {
        if is_gone(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_graceful_stop() {
    let sup = supervisor(WorkerCommand::new("sleep").args(["30"]));

    let start = sup.start().await;
    assert_eq!(start.status, StartStatus::Started);
    let pid = start.pid.unwrap();

    let again = sup.start().await;
    assert_eq!(again.status, StartStatus::AlreadyRunning);
    assert_eq!(again.pid, Some(pid));

    let began = Instant::now();
    let stop = sup.stop().await;
    assert!(stop.ok);
    assert_eq!(stop.status, StopStatus::Killed(pid));
    assert!(began.elapsed() < RUNG + SLACK);
    assert!(wait_until_gone(pid).await);
    assert_eq!(sup.status().phase, Phase::Idle);
}

#[tokio::test]
async fn test_term_ignoring_worker_is_killed_by_group_rung() {
    let sup = supervisor(shell("trap '' TERM; while :; do sleep 1; done"));
    let pid = sup.start().await.pid.unwrap();

    // Let the shell install its trap before the ladder starts.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let began = Instant::now();
    let stop = sup.stop().await;
    let elapsed = began.elapsed();

    assert_eq!(stop.status, StopStatus::Killed(pid));
    assert!(elapsed >= RUNG, "cooperative rung should have been waited out");
    assert!(elapsed < RUNG * 2 + SLACK);
    assert!(wait_until_gone(pid).await);
}

#[tokio::test]
async fn test_group_stop_reaches_grandchildren() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());

    let sup = supervisor(shell(&script));
    sup.start().await;

    let deadline = Instant::now() + SLACK;
    let grandchild = loop {
        if let Ok(raw) = std::fs::read_to_string(&pid_file) {
            if let Ok(pid) = raw.trim().parse::<u32>() {
                break pid;
            }
        }
        assert!(Instant::now() < deadline, "grandchild never reported its pid");
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    assert!(sup.stop().await.ok);
    assert!(wait_until_gone(grandchild).await);
}

#[tokio::test]
async fn test_external_kill_leaves_stale_handle_that_start_replaces() {
    let sup = supervisor(WorkerCommand::new("sleep").args(["30"]));
    let first = sup.start().await.pid.unwrap();

    let status = Command::new("kill")
        .args(["-9", &first.to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    tokio::time::sleep(Duration::from_millis(200)).await;

    let report = sup.start().await;
    assert_eq!(report.status, StartStatus::Started);
    assert_ne!(report.pid, Some(first));

    assert!(sup.stop().await.ok);
}

#[tokio::test]
async fn test_missing_program_reports_error_and_stays_idle() {
    let sup = supervisor(WorkerCommand::new("/nonexistent/agent-worker"));

    for _ in 0..2 {
        let report = sup.start().await;
        assert!(!report.ok);
        assert!(report.status.to_string().starts_with("error:"));
        assert_eq!(report.pid, None);
        assert_eq!(sup.status().phase, Phase::Idle);
    }

    assert_eq!(sup.stop().await.status, StopStatus::NotRunning);
}

#[tokio::test]
async fn test_cancelled_stop_does_not_orphan_worker() {
    let sup = Supervisor::new(
        PlatformBackend::new(),
        shell("trap '' TERM; while :; do sleep 1; done"),
        EscalationBudget::uniform(Duration::from_secs(2)),
    );
    let first = sup.start().await.pid.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Dropped while the cooperative rung is still waiting.
    let cancelled = tokio::time::timeout(Duration::from_millis(500), sup.stop()).await;
    assert!(cancelled.is_err());
    assert!(!is_gone(first));
    assert_eq!(sup.status().phase, Phase::Running);

    let again = sup.start().await;
    assert_eq!(again.status, StartStatus::AlreadyRunning);
    assert_eq!(again.pid, Some(first));

    let stop = sup.stop().await;
    assert_eq!(stop.status, StopStatus::Killed(first));
    assert!(wait_until_gone(first).await);
}
