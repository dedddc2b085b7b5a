//! Single-worker supervisor.

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::escalator::{EscalationBudget, Escalator};
use crate::config::Config;
use crate::domain::{
    Phase, ProcessHandle, StartReport, StatusReport, StopReport, TerminationOutcome, WorkerCommand,
};
use crate::ports::ProcessBackend;

/// Authoritative worker state. A handle exists iff the worker is running.
#[derive(Debug, Default)]
enum WorkerSlot {
    #[default]
    Idle,
    Running(ProcessHandle),
}

/// Owns at most one worker process and serializes every start/stop.
///
/// Both operations hold one async mutex for their whole duration, so
/// concurrent starts collapse into a single launch and concurrent stops into
/// a single termination ladder. A stop can therefore hold the lock for up to
/// [`EscalationBudget::total`].
pub struct Supervisor<B: ProcessBackend> {
    backend: B,
    command: WorkerCommand,
    budget: EscalationBudget,
    slot: Mutex<WorkerSlot>,
    // Written only while `slot` is held; read without waiting on it.
    snapshot: RwLock<StatusReport>,
}

impl<B: ProcessBackend> Supervisor<B> {
    /// Create a supervisor for `command` on top of `backend`.
    pub fn new(backend: B, command: WorkerCommand, budget: EscalationBudget) -> Self {
        Self {
            backend,
            command,
            budget,
            slot: Mutex::new(WorkerSlot::Idle),
            snapshot: RwLock::new(StatusReport::default()),
        }
    }

    /// Create a supervisor from a loaded configuration.
    pub fn from_config(backend: B, config: &Config) -> Self {
        Self::new(backend, config.worker.clone(), config.escalation.budget())
    }

    /// The command this supervisor launches.
    pub fn command(&self) -> &WorkerCommand {
        &self.command
    }

    /// Launch the worker unless one is already alive.
    pub async fn start(&self) -> StartReport {
        let mut slot = self.slot.lock().await;

        if let WorkerSlot::Running(handle) = &*slot {
            if self.backend.probe(handle) {
                info!(pid = handle.pid, "Worker already running");
                return StartReport::already_running(handle.pid);
            }
            warn!(pid = handle.pid, "Worker exited on its own, discarding stale handle");
            *slot = WorkerSlot::Idle;
            self.publish(Phase::Idle, None);
        }

        match self.backend.launch(&self.command) {
            Ok(handle) => {
                let pid = handle.pid;
                info!(pid = pid, command = %self.command, "Worker started");
                self.publish(Phase::Running, Some(&handle));
                *slot = WorkerSlot::Running(handle);
                StartReport::started(pid)
            }
            Err(e) => {
                error!(command = %self.command, error = %e, "Failed to start worker");
                StartReport::error(e)
            }
        }
    }

    /// Terminate the worker, if any, through the escalation ladder.
    pub async fn stop(&self) -> StopReport {
        let mut slot = self.slot.lock().await;

        let handle = match &*slot {
            WorkerSlot::Idle => {
                info!("Worker was not running");
                return StopReport::not_running();
            }
            WorkerSlot::Running(handle) => handle.clone(),
        };

        if !self.backend.probe(&handle) {
            warn!(pid = handle.pid, "Worker exited on its own, discarding stale handle");
            *slot = WorkerSlot::Idle;
            self.publish(Phase::Idle, None);
            return StopReport::not_running();
        }

        self.publish(Phase::Stopping, Some(&handle));
        let in_flight = StopInFlight {
            supervisor: self,
            handle: &handle,
            finished: false,
        };
        let outcome = Escalator::new(&self.backend, self.budget)
            .terminate(&handle)
            .await;
        in_flight.finish();

        // Cleared even on error so the supervisor never sticks in Running.
        *slot = WorkerSlot::Idle;
        self.publish(Phase::Idle, None);

        match outcome {
            TerminationOutcome::Error { message } => {
                error!(pid = handle.pid, error = %message, "Worker may be orphaned");
                StopReport::error(message)
            }
            outcome => {
                info!(pid = handle.pid, outcome = %outcome, "Worker stopped");
                StopReport::killed(handle.pid)
            }
        }
    }

    /// Current phase and worker identity, without waiting on start/stop.
    pub fn status(&self) -> StatusReport {
        self.snapshot.read().clone()
    }

    /// Stop the worker before the supervisor itself exits.
    pub async fn shutdown(&self) -> StopReport {
        info!("Supervisor shutting down");
        self.stop().await
    }

    fn publish(&self, phase: Phase, handle: Option<&ProcessHandle>) {
        *self.snapshot.write() = StatusReport {
            phase,
            pid: handle.map(|h| h.pid),
            launched_at: handle.map(|h| h.launched_at),
        };
    }
}

/// Restores the `Running` snapshot if a stop is dropped mid-ladder.
///
/// The slot still owns the handle in that case, so the next start or stop
/// probes the same worker instead of losing track of it.
struct StopInFlight<'a, B: ProcessBackend> {
    supervisor: &'a Supervisor<B>,
    handle: &'a ProcessHandle,
    finished: bool,
}

impl<B: ProcessBackend> StopInFlight<'_, B> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl<B: ProcessBackend> Drop for StopInFlight<'_, B> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(pid = self.handle.pid, "Stop cancelled before the worker exited");
            self.supervisor.publish(Phase::Running, Some(self.handle));
        }
    }
}
