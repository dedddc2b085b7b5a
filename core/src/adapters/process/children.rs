//! Bookkeeping for spawned children shared by the platform backends.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::Child;
use tracing::{debug, warn};

use crate::error::SignalError;

/// Children launched by a backend, keyed by pid.
///
/// An entry exists until the child's exit has been observed and reaped.
#[derive(Debug, Default)]
pub(super) struct ChildTable {
    children: Mutex<HashMap<u32, Child>>,
}

impl ChildTable {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn insert(&self, pid: u32, child: Child) {
        if let Some(mut stale) = self.children.lock().insert(pid, child) {
            // The OS recycled a pid we never saw exit; reap the old entry.
            let _ = stale.try_wait();
        }
    }

    pub(super) fn contains(&self, pid: u32) -> bool {
        self.children.lock().contains_key(&pid)
    }

    /// Non-blocking exit check; forgets the child once it has exited.
    pub(super) fn is_alive(&self, pid: u32) -> bool {
        let mut children = self.children.lock();

        let Some(child) = children.get_mut(&pid) else {
            return false;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = pid, status = %status, "Child has exited");
                children.remove(&pid);
                false
            }
            Ok(None) => true,
            Err(e) => {
                // Exit not confirmed, so keep treating it as alive.
                warn!(pid = pid, error = %e, "Failed to poll child status");
                true
            }
        }
    }

    /// Wait up to `timeout` for the child to exit.
    ///
    /// Cancel-safe: if the returned future is dropped before the child is
    /// reaped, the child goes back into the table.
    pub(super) async fn wait(&self, pid: u32, timeout: Duration) -> Result<bool, SignalError> {
        // Callers are serialized by the supervisor lock, so taking the child
        // out for the duration of the wait cannot race another probe.
        let Some(child) = self.children.lock().remove(&pid) else {
            return Ok(true);
        };
        let mut pending = PendingWait {
            table: self,
            pid,
            child: Some(child),
        };
        let Some(child) = pending.child.as_mut() else {
            return Ok(true);
        };

        let waited = tokio::time::timeout(timeout, child.wait()).await;
        match waited {
            Ok(Ok(status)) => {
                debug!(pid = pid, status = %status, "Child exited within budget");
                pending.reaped();
                Ok(true)
            }
            Ok(Err(e)) => Err(SignalError::Io(e)),
            Err(_) => {
                debug!(pid = pid, timeout_ms = timeout.as_millis() as u64, "Wait timed out");
                Ok(false)
            }
        }
    }

    /// Ask the runtime to kill the child directly, bypassing any group.
    #[cfg_attr(unix, allow(dead_code))]
    pub(super) fn start_kill(&self, pid: u32) -> Result<(), SignalError> {
        let mut children = self.children.lock();
        let child = children
            .get_mut(&pid)
            .ok_or(SignalError::ProcessNotFound(pid))?;
        child.start_kill().map_err(SignalError::Io)
    }
}

/// A child taken out of the table for a wait. Unless marked reaped, it is
/// returned to the table on drop, including when the wait is cancelled.
struct PendingWait<'a> {
    table: &'a ChildTable,
    pid: u32,
    child: Option<Child>,
}

impl PendingWait<'_> {
    fn reaped(mut self) {
        self.child = None;
    }
}

impl Drop for PendingWait<'_> {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            self.table.children.lock().insert(self.pid, child);
        }
    }
}
