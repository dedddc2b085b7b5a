//! Termination ladder.
//!
//! Turns "stop this worker" into at most three attempts of increasing force:
//!
//! 1. cooperative signal to the process group, wait `graceful`
//! 2. forceful signal to the process group, wait `forceful`
//! 3. forceful signal to the pid alone, wait `direct`
//!
//! Every path through the ladder returns a [`TerminationOutcome`] within
//! `graceful + forceful + direct` plus signal delivery time.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{ProcessHandle, SignalKind, TerminationOutcome};
use crate::error::SignalError;
use crate::ports::ProcessBackend;

/// Message reported when the final rung ends without a confirmed exit.
pub const EXHAUSTED_MESSAGE: &str = "process did not exit after escalation";

/// Default per-rung wait (5 seconds).
const DEFAULT_RUNG_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-rung wait budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationBudget {
    pub graceful: Duration,
    pub forceful: Duration,
    pub direct: Duration,
}

impl EscalationBudget {
    /// Same timeout for every rung.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            graceful: timeout,
            forceful: timeout,
            direct: timeout,
        }
    }

    /// Worst-case time spent waiting across the ladder.
    pub fn total(&self) -> Duration {
        self.graceful + self.forceful + self.direct
    }
}

impl Default for EscalationBudget {
    fn default() -> Self {
        Self::uniform(DEFAULT_RUNG_TIMEOUT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rung {
    Graceful,
    ForcefulGroup,
    Direct,
}

impl Rung {
    const LADDER: [Rung; 3] = [Rung::Graceful, Rung::ForcefulGroup, Rung::Direct];

    fn kind(self) -> SignalKind {
        match self {
            Rung::Graceful => SignalKind::Cooperative,
            Rung::ForcefulGroup | Rung::Direct => SignalKind::Forceful,
        }
    }

    fn timeout(self, budget: &EscalationBudget) -> Duration {
        match self {
            Rung::Graceful => budget.graceful,
            Rung::ForcefulGroup => budget.forceful,
            Rung::Direct => budget.direct,
        }
    }

    fn outcome(self, pid: u32) -> TerminationOutcome {
        match self {
            Rung::Graceful => TerminationOutcome::KilledGracefully { pid },
            Rung::ForcefulGroup | Rung::Direct => TerminationOutcome::KilledForcefully { pid },
        }
    }
}

/// Drives a worker through the termination ladder.
pub struct Escalator<'a, B: ProcessBackend> {
    backend: &'a B,
    budget: EscalationBudget,
}

impl<'a, B: ProcessBackend> Escalator<'a, B> {
    pub fn new(backend: &'a B, budget: EscalationBudget) -> Self {
        Self { backend, budget }
    }

    /// Terminate the process behind `handle`.
    ///
    /// Never fails: signal and wait errors are absorbed rung by rung, and
    /// only the last one can surface as [`TerminationOutcome::Error`].
    pub async fn terminate(&self, handle: &ProcessHandle) -> TerminationOutcome {
        if !self.backend.probe(handle) {
            debug!(pid = handle.pid, "Process already exited before escalation");
            return TerminationOutcome::AlreadyNotRunning;
        }

        let mut last_error: Option<SignalError> = None;

        for rung in Rung::LADDER {
            match self.climb(handle, rung).await {
                Ok(true) => {
                    let outcome = rung.outcome(handle.pid);
                    info!(pid = handle.pid, rung = ?rung, "Process exited");
                    return outcome;
                }
                Ok(false) => {
                    debug!(pid = handle.pid, rung = ?rung, "Process still alive, escalating");
                    last_error = None;
                }
                Err(e) => {
                    warn!(pid = handle.pid, rung = ?rung, error = %e, "Rung failed, escalating");
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| EXHAUSTED_MESSAGE.to_string());
        warn!(pid = handle.pid, error = %message, "Escalation exhausted");
        TerminationOutcome::Error { message }
    }

    /// Run one rung. `Ok(true)` means exit was confirmed.
    async fn climb(&self, handle: &ProcessHandle, rung: Rung) -> Result<bool, SignalError> {
        let kind = rung.kind();
        let sent = match rung {
            Rung::Graceful | Rung::ForcefulGroup => self.backend.signal_group(handle, kind).await,
            Rung::Direct => self.backend.signal_process(handle, kind).await,
        };

        match sent {
            Ok(()) => {}
            // A vanished target means the process is gone or going; confirm below.
            Err(e) if e.is_gone() => {
                debug!(pid = handle.pid, rung = ?rung, "Signal target already gone");
            }
            Err(e) => {
                // Nothing was delivered, so waiting out the budget is pointless.
                return if self.backend.probe(handle) {
                    Err(e)
                } else {
                    Ok(true)
                };
            }
        }

        self.backend.wait_exit(handle, rung.timeout(&self.budget)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake::{Behaviour, FakeBackend};
    use crate::domain::WorkerCommand;
    use std::time::Instant;

    fn budget() -> EscalationBudget {
        EscalationBudget::uniform(Duration::from_millis(40))
    }

    async fn run(behaviour: Behaviour) -> (FakeBackend, TerminationOutcome) {
        let backend = FakeBackend::new();
        backend.set_behaviour(behaviour);
        let handle = backend.launch(&WorkerCommand::new("worker")).unwrap();
        let outcome = Escalator::new(&backend, budget()).terminate(&handle).await;
        (backend, outcome)
    }

    #[tokio::test]
    async fn test_cooperative_worker_exits_on_first_rung() {
        let (backend, outcome) = run(Behaviour::Cooperative).await;
        assert!(matches!(outcome, TerminationOutcome::KilledGracefully { .. }));
        assert_eq!(backend.signals().len(), 1);
    }

    #[tokio::test]
    async fn test_ignoring_term_needs_forceful_group_rung() {
        let (backend, outcome) = run(Behaviour::IgnoresCooperative).await;
        assert!(matches!(outcome, TerminationOutcome::KilledForcefully { .. }));
        assert_eq!(
            backend.signals(),
            vec![
                ("group", SignalKind::Cooperative),
                ("group", SignalKind::Forceful)
            ]
        );
    }

    #[tokio::test]
    async fn test_detached_worker_needs_direct_rung() {
        let (backend, outcome) = run(Behaviour::DetachedFromGroup).await;
        assert!(matches!(outcome, TerminationOutcome::KilledForcefully { .. }));
        assert_eq!(backend.signals().len(), 3);
        assert_eq!(backend.signals()[2], ("process", SignalKind::Forceful));
    }

    #[tokio::test]
    async fn test_unkillable_worker_exhausts_within_budget() {
        let started = Instant::now();
        let (_backend, outcome) = run(Behaviour::Unkillable).await;
        assert_eq!(
            outcome,
            TerminationOutcome::Error {
                message: EXHAUSTED_MESSAGE.to_string()
            }
        );
        assert!(started.elapsed() < budget().total() + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_signal_failures_escalate_and_last_one_surfaces() {
        let (backend, outcome) = run(Behaviour::SignalsDenied).await;
        match outcome {
            TerminationOutcome::Error { message } => assert!(message.contains("Permission denied")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(backend.signals().len(), 3);
    }

    #[tokio::test]
    async fn test_vanished_group_counts_as_exit() {
        let (_backend, outcome) = run(Behaviour::GroupVanished).await;
        assert!(matches!(outcome, TerminationOutcome::KilledGracefully { .. }));
    }

    #[tokio::test]
    async fn test_dead_process_is_already_not_running() {
        let backend = FakeBackend::new();
        let handle = backend.launch(&WorkerCommand::new("worker")).unwrap();
        backend.crash(&handle);

        let outcome = Escalator::new(&backend, budget()).terminate(&handle).await;
        assert_eq!(outcome, TerminationOutcome::AlreadyNotRunning);
        assert!(backend.signals().is_empty());
    }

    #[test]
    fn test_default_budget() {
        let budget = EscalationBudget::default();
        assert_eq!(budget.graceful, Duration::from_secs(5));
        assert_eq!(budget.total(), Duration::from_secs(15));
    }
}
