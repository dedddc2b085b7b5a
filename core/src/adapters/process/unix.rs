//! Unix process backend.
//!
//! The worker is spawned as the leader of a new process group, so the whole
//! tree it forks can be addressed with `killpg`:
//! - `Cooperative` → SIGTERM
//! - `Forceful` → SIGKILL

use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::{getpgid, Pid};
use tracing::{debug, info, warn};

use super::base_command;
use super::children::ChildTable;
use crate::domain::{ProcessHandle, SignalKind, WorkerCommand};
use crate::error::{LaunchError, SignalError};
use crate::ports::ProcessBackend;

/// Unix process backend built on `nix`.
#[derive(Debug, Default)]
pub struct UnixBackend {
    children: ChildTable,
}

impl UnixBackend {
    /// Create a new UnixBackend instance
    pub fn new() -> Self {
        Self {
            children: ChildTable::new(),
        }
    }

    /// Resolve the live process group of `pid`.
    fn resolve_group(&self, pid: u32) -> Result<Pid, SignalError> {
        // A reaped pid may already belong to somebody else.
        if !self.children.contains(pid) {
            return Err(SignalError::GroupNotFound(pid));
        }

        getpgid(Some(Pid::from_raw(pid as i32))).map_err(|errno| match errno {
            Errno::ESRCH => SignalError::GroupNotFound(pid),
            other => map_errno(pid, other),
        })
    }
}

fn signal_for(kind: SignalKind) -> Signal {
    match kind {
        SignalKind::Cooperative => Signal::SIGTERM,
        SignalKind::Forceful => Signal::SIGKILL,
    }
}

fn map_errno(pid: u32, errno: Errno) -> SignalError {
    match errno {
        Errno::ESRCH => SignalError::ProcessNotFound(pid),
        Errno::EPERM => SignalError::PermissionDenied(pid),
        other => SignalError::CommandFailed(format!("signal to {} failed: {}", pid, other)),
    }
}

impl ProcessBackend for UnixBackend {
    fn launch(&self, command: &WorkerCommand) -> Result<ProcessHandle, LaunchError> {
        let mut cmd = base_command(command)?;
        // pgid 0: the child becomes leader of a group named after its pid.
        cmd.process_group(0);

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
        let pgid = self.resolve_group(handle.pid)?;
        let signal = signal_for(kind);
        debug!(pid = handle.pid, pgid = pgid.as_raw(), signal = ?signal, "Sending signal to process group");

        killpg(pgid, signal).map_err(|errno| match errno {
            Errno::ESRCH => SignalError::GroupNotFound(handle.pid),
            other => {
                warn!(pid = handle.pid, error = %other, "Failed to signal process group");
                map_errno(handle.pid, other)
            }
        })
    }

    async fn signal_process(
        &self,
        handle: &ProcessHandle,
        kind: SignalKind,
    ) -> Result<(), SignalError> {
        if !self.children.contains(handle.pid) {
            return Err(SignalError::ProcessNotFound(handle.pid));
        }

        let signal = signal_for(kind);
        debug!(pid = handle.pid, signal = ?signal, "Sending signal to process");
        kill(Pid::from_raw(handle.pid as i32), signal).map_err(|errno| map_errno(handle.pid, errno))
    }

    async fn wait_exit(&self, handle: &ProcessHandle, timeout: Duration) -> Result<bool, SignalError> {
        self.children.wait(handle.pid, timeout).await
    }
}
