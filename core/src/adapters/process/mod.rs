//! Process backend adapters.
//!
//! Platform-specific implementations of [`ProcessBackend`]:
//! - Unix: process groups via `setpgid`, delivery with `killpg`/`kill`
//! - Windows: `CREATE_NEW_PROCESS_GROUP`, Ctrl+Break, `taskkill` and
//!   `TerminateProcess`

mod children;

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

use std::time::Duration;

use tokio::process::Command;

use crate::domain::{ProcessHandle, SignalKind, WorkerCommand};
use crate::error::{LaunchError, SignalError};
use crate::ports::ProcessBackend;

#[cfg(not(any(unix, windows)))]
compile_error!("Unsupported platform: only Unix and Windows are supported");

/// The process backend for the current platform.
pub struct PlatformBackend {
    #[cfg(unix)]
    inner: unix::UnixBackend,

    #[cfg(windows)]
    inner: windows::WindowsBackend,
}

impl PlatformBackend {
    /// Create a new backend for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            inner: unix::UnixBackend::new(),

            #[cfg(windows)]
            inner: windows::WindowsBackend::new(),
        }
    }
}

impl Default for PlatformBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessBackend for PlatformBackend {
    fn launch(&self, command: &WorkerCommand) -> Result<ProcessHandle, LaunchError> {
        self.inner.launch(command)
    }

    fn probe(&self, handle: &ProcessHandle) -> bool {
        self.inner.probe(handle)
    }

    async fn signal_group(&self, handle: &ProcessHandle, kind: SignalKind) -> Result<(), SignalError> {
        self.inner.signal_group(handle, kind).await
    }

    async fn signal_process(
        &self,
        handle: &ProcessHandle,
        kind: SignalKind,
    ) -> Result<(), SignalError> {
        self.inner.signal_process(handle, kind).await
    }

    async fn wait_exit(&self, handle: &ProcessHandle, timeout: Duration) -> Result<bool, SignalError> {
        self.inner.wait_exit(handle, timeout).await
    }
}

/// Build the platform-neutral part of the worker command.
///
/// Streams are inherited so an unread pipe can never stall the worker.
fn base_command(command: &WorkerCommand) -> Result<Command, LaunchError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .envs(&command.env)
        .stdin(std::process::Stdio::inherit())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .kill_on_drop(false);

    if let Some(dir) = &command.working_dir {
        if !dir.is_dir() {
            return Err(LaunchError::Spawn(format!(
                "working directory {} does not exist",
                dir.display()
            )));
        }
        cmd.current_dir(dir);
    }

    Ok(cmd)
}
