//! Windows process backend.
//!
//! Windows has no signal groups, so the ladder is expressed with:
//! - `GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT)` for a cooperative group stop
//!   (the worker is spawned with `CREATE_NEW_PROCESS_GROUP`)
//! - `taskkill /PID xxx /T /F` for a forceful stop of the whole tree
//! - `TerminateProcess` on the retained child handle for the direct rung
//! - `taskkill /PID xxx` for a cooperative stop of a single process

use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};
use windows::Win32::System::Console::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};
use windows::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP;

use super::base_command;
use super::children::ChildTable;
use crate::domain::{ProcessHandle, SignalKind, WorkerCommand};
use crate::error::{LaunchError, SignalError};
use crate::ports::ProcessBackend;

/// Windows process backend.
#[derive(Debug, Default)]
pub struct WindowsBackend {
    children: ChildTable,
}

impl WindowsBackend {
    /// Create a new WindowsBackend instance
    pub fn new() -> Self {
        Self {
            children: ChildTable::new(),
        }
    }

    /// Run `taskkill` against the worker in the given reach.
    async fn taskkill(&self, pid: u32, reach: TaskKill) -> Result<(), SignalError> {
        let flags = reach.flags();
        debug!(pid = pid, flags = ?flags, "Running taskkill");

        let output = Command::new("taskkill")
            .arg("/PID")
            .arg(pid.to_string())
            .args(flags)
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }

        let report = format!(
            "{} {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let result = classify_taskkill_failure(pid, reach, report.trim());
        if let Err(e) = &result {
            warn!(pid = pid, flags = ?flags, error = %e, "taskkill failed");
        }
        result
    }
}

/// What a `taskkill` invocation targets, and how hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskKill {
    /// `WM_CLOSE` to the worker alone.
    Close,
    /// `/T /F`: terminate the worker and every descendant.
    ForceTree,
}

impl TaskKill {
    fn flags(self) -> &'static [&'static str] {
        match self {
            TaskKill::Close => &[],
            TaskKill::ForceTree => &["/T", "/F"],
        }
    }
}

/// Map taskkill's failure text onto a [`SignalError`].
///
/// A tree kill that finds nothing reports the group as gone; a process that
/// exited while taskkill ran counts as delivered.
fn classify_taskkill_failure(pid: u32, reach: TaskKill, report: &str) -> Result<(), SignalError> {
    let lower = report.to_lowercase();

    if lower.contains("not found") || lower.contains("could not be found") {
        return Err(match reach {
            TaskKill::ForceTree => SignalError::GroupNotFound(pid),
            TaskKill::Close => SignalError::ProcessNotFound(pid),
        });
    }
    if lower.contains("access is denied") || lower.contains("access denied") {
        return Err(SignalError::PermissionDenied(pid));
    }
    if lower.contains("already been terminated") || lower.contains("has exited") {
        return Ok(());
    }

    Err(SignalError::CommandFailed(format!(
        "taskkill /PID {} {}: {}",
        pid,
        reach.flags().join(" "),
        report
    )))
}

impl ProcessBackend for WindowsBackend {
    fn launch(&self, command: &WorkerCommand) -> Result<ProcessHandle, LaunchError> {
        let mut cmd = base_command(command)?;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP.0);

        let child = cmd
            .spawn()
            .map_err(|e| LaunchError::from_io(&command.program, e))?;
        let pid = child
            .id()
            .ok_or_else(|| LaunchError::Spawn("child exited before its pid was read".to_string()))?;

        self.children.insert(pid, child);
        info!(pid = pid, command = %command, "Launched worker in new process group");
        Ok(ProcessHandle::new(pid))
    }

    fn probe(&self, handle: &ProcessHandle) -> bool {
        self.children.is_alive(handle.pid)
    }

    async fn signal_group(&self, handle: &ProcessHandle, kind: SignalKind) -> Result<(), SignalError> {
        if !self.children.contains(handle.pid) {
            return Err(SignalError::GroupNotFound(handle.pid));
        }

        match kind {
            SignalKind::Cooperative => {
                debug!(pid = handle.pid, pgid = handle.pgid, "Sending Ctrl+Break to process group");
                // SAFETY: plain FFI call with no pointers; the group id was
                // assigned by CREATE_NEW_PROCESS_GROUP at launch.
                let sent = unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, handle.pgid) };
                sent.map_err(|e| {
                    SignalError::CommandFailed(format!("GenerateConsoleCtrlEvent failed: {}", e))
                })
            }
            SignalKind::Forceful => self.taskkill(handle.pid, TaskKill::ForceTree).await,
        }
    }

    async fn signal_process(
        &self,
        handle: &ProcessHandle,
        kind: SignalKind,
    ) -> Result<(), SignalError> {
        match kind {
            SignalKind::Cooperative => self.taskkill(handle.pid, TaskKill::Close).await,
            SignalKind::Forceful => {
                debug!(pid = handle.pid, "Terminating process directly");
                self.children.start_kill(handle.pid)
            }
        }
    }

    async fn wait_exit(&self, handle: &ProcessHandle, timeout: Duration) -> Result<bool, SignalError> {
        self.children.wait(handle.pid, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinger() -> WorkerCommand {
        WorkerCommand::new("ping").args(["-n", "30", "127.0.0.1"])
    }

    #[tokio::test]
    async fn test_launch_and_force_kill() {
        let backend = WindowsBackend::new();
        let handle = backend.launch(&pinger()).unwrap();
        assert!(backend.probe(&handle));

        backend
            .signal_process(&handle, SignalKind::Forceful)
            .await
            .unwrap();
        assert!(backend.wait_exit(&handle, Duration::from_secs(5)).await.unwrap());
        assert!(!backend.probe(&handle));
    }

    #[test]
    fn test_classify_taskkill_failure() {
        let err = classify_taskkill_failure(
            42,
            TaskKill::ForceTree,
            "ERROR: The process \"42\" not found.",
        )
        .unwrap_err();
        assert!(matches!(err, SignalError::GroupNotFound(42)));

        let err = classify_taskkill_failure(42, TaskKill::Close, "ERROR: The process \"42\" not found.")
            .unwrap_err();
        assert!(matches!(err, SignalError::ProcessNotFound(42)));

        let err = classify_taskkill_failure(42, TaskKill::ForceTree, "ERROR: Access is denied.")
            .unwrap_err();
        assert!(matches!(err, SignalError::PermissionDenied(42)));

        assert!(classify_taskkill_failure(42, TaskKill::Close, "The process has exited.").is_ok());

        let err = classify_taskkill_failure(42, TaskKill::ForceTree, "ERROR: Invalid syntax.")
            .unwrap_err();
        assert!(err.to_string().contains("/T /F"));
    }

    #[tokio::test]
    async fn test_launch_missing_program() {
        let backend = WindowsBackend::new();
        let result = backend.launch(&WorkerCommand::new("definitely-not-a-real-binary.exe"));
        assert!(matches!(result, Err(LaunchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_group_signal_after_exit_reports_gone() {
        let backend = WindowsBackend::new();
        let handle = backend.launch(&pinger()).unwrap();
        backend
            .signal_process(&handle, SignalKind::Forceful)
            .await
            .unwrap();
        assert!(backend.wait_exit(&handle, Duration::from_secs(5)).await.unwrap());

        let err = backend
            .signal_group(&handle, SignalKind::Forceful)
            .await
            .unwrap_err();
        assert!(err.is_gone());
    }
}
