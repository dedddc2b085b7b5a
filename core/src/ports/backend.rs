//! Process backend port (interface).

use std::time::Duration;

use crate::domain::{ProcessHandle, SignalKind, WorkerCommand};
use crate::error::{LaunchError, SignalError};

/// Port for launching, signalling and reaping the worker.
///
/// This is the only seam allowed to touch OS process APIs. Implementations
/// map [`SignalKind`] to their native primitives and resolve process groups
/// in their own way; callers only rely on the contract below.
pub trait ProcessBackend: Send + Sync {
    /// Start `command` detached in a new process group.
    ///
    /// Standard streams are inherited, never piped.
    fn launch(&self, command: &WorkerCommand) -> Result<ProcessHandle, LaunchError>;

    /// Non-blocking liveness probe.
    ///
    /// Returns true until the process has been confirmed exited.
    fn probe(&self, handle: &ProcessHandle) -> bool;

    /// Deliver `kind` to every process in the handle's group.
    ///
    /// A group that can no longer be resolved is reported as
    /// [`SignalError::GroupNotFound`].
    fn signal_group(
        &self,
        handle: &ProcessHandle,
        kind: SignalKind,
    ) -> impl std::future::Future<Output = Result<(), SignalError>> + Send;

    /// Deliver `kind` to the handle's pid only.
    fn signal_process(
        &self,
        handle: &ProcessHandle,
        kind: SignalKind,
    ) -> impl std::future::Future<Output = Result<(), SignalError>> + Send;

    /// Wait up to `timeout` for the process to exit.
    ///
    /// Returns `Ok(true)` iff exit was confirmed within the budget.
    fn wait_exit(
        &self,
        handle: &ProcessHandle,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<bool, SignalError>> + Send;
}
